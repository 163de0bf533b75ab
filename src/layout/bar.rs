use serde::Serialize;

use super::{Circle, Point, Rect};
use crate::model::{GanttOptions, Task, Timeline};

/// Width of the left/right resize handles.
pub const HANDLE_WIDTH: f64 = 8.0;
/// Narrowest a bar may be resized to.
pub const MIN_BAR_WIDTH: f64 = HANDLE_WIDTH * 2.0 + 3.0;
/// Gap between a bar's right edge and an overflowing label.
const LABEL_OVERFLOW_GAP: f64 = 5.0;

/// The interactive pieces of a bar, in hit-test priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BarPart {
    Connector,
    ProgressHandle,
    LeftHandle,
    RightHandle,
    Body,
}

/// Where a bar's label is drawn. `overflow` places it right of the bar
/// because it is wider than the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub x: f64,
    pub y: f64,
    pub overflow: bool,
}

/// Geometry of one task bar for the current layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    pub task_id: String,
    pub rect: Rect,
    pub progress_width: f64,
    pub corner_radius: f64,
    pub invalid: bool,
    pub label: Option<String>,
    /// Rendered label width, reported back by the front end once text is laid out.
    pub label_width: Option<f64>,
    pub custom_class: Option<String>,
}

impl BarLayout {
    pub fn compute(task: &Task, timeline: &Timeline, options: &GanttOptions) -> Self {
        let x = timeline.date_to_x(task.start);
        let width = timeline.hours_to_width(task.duration_hours()).max(0.0);
        let rect = Rect::new(x, row_y(task.index, options), width, options.bar_height);
        Self {
            task_id: task.id.clone(),
            rect,
            progress_width: progress_width(width, Some(task.progress as f64)),
            corner_radius: options.bar_corner_radius,
            invalid: task.invalid,
            label: task.show_label.then(|| task.name.clone()),
            label_width: None,
            custom_class: task.custom_class.clone(),
        }
    }

    /// Move or resize the bar. A width under [`MIN_BAR_WIDTH`] is ignored.
    /// The progress fill keeps its fraction of the bar.
    pub fn set_position(&mut self, x: Option<f64>, y: Option<f64>, width: Option<f64>, progress: u8) {
        if let Some(x) = x.filter(|v| v.is_finite()) {
            self.rect.x = x;
        }
        if let Some(y) = y.filter(|v| v.is_finite()) {
            self.rect.y = y;
        }
        if let Some(width) = width.filter(|w| w.is_finite() && *w >= MIN_BAR_WIDTH) {
            self.rect.width = width;
        }
        self.progress_width = progress_width(self.rect.width, Some(progress as f64));
    }

    pub fn progress_rect(&self) -> Option<Rect> {
        if self.invalid {
            return None;
        }
        Some(Rect::new(
            self.rect.x,
            self.rect.y,
            self.progress_width,
            self.rect.height,
        ))
    }

    pub fn left_handle(&self) -> Option<Rect> {
        if self.invalid {
            return None;
        }
        Some(Rect::new(
            self.rect.x + 1.0,
            self.rect.y + 1.0,
            HANDLE_WIDTH,
            self.rect.height - 2.0,
        ))
    }

    pub fn right_handle(&self) -> Option<Rect> {
        if self.invalid {
            return None;
        }
        Some(Rect::new(
            self.rect.end_x() - HANDLE_WIDTH - 1.0,
            self.rect.y + 1.0,
            HANDLE_WIDTH,
            self.rect.height - 2.0,
        ))
    }

    /// Triangle sitting under the end of the progress fill.
    pub fn progress_handle(&self) -> Option<[Point; 3]> {
        let fill = self.progress_rect()?;
        let bottom = fill.bottom();
        Some([
            Point::new(fill.end_x() - 5.0, bottom),
            Point::new(fill.end_x() + 5.0, bottom),
            Point::new(fill.end_x(), bottom - 8.66),
        ])
    }

    /// Circle below the bar's left edge that starts a dependency drag.
    pub fn connector(&self) -> Option<Circle> {
        if self.invalid {
            return None;
        }
        Some(Circle {
            cx: self.rect.x,
            cy: self.rect.y + self.rect.height * 5.0 / 4.0,
            r: self.rect.height / 4.0,
        })
    }

    pub fn label_placement(&self) -> Option<LabelPlacement> {
        self.label.as_ref()?;
        let y = self.rect.y + self.rect.height / 2.0;
        let placement = match self.label_width {
            Some(w) if w > self.rect.width => LabelPlacement {
                x: self.rect.end_x() + LABEL_OVERFLOW_GAP,
                y,
                overflow: true,
            },
            _ => LabelPlacement {
                x: self.rect.x + self.rect.width / 2.0,
                y,
                overflow: false,
            },
        };
        Some(placement)
    }

    /// Which part of the bar, if any, lies under `p`.
    pub fn hit(&self, p: Point) -> Option<BarPart> {
        if self.connector().is_some_and(|c| c.contains(p)) {
            return Some(BarPart::Connector);
        }
        if self.progress_handle().is_some_and(|tri| triangle_contains(tri, p)) {
            return Some(BarPart::ProgressHandle);
        }
        if self.left_handle().is_some_and(|h| h.contains(p)) {
            return Some(BarPart::LeftHandle);
        }
        if self.right_handle().is_some_and(|h| h.contains(p)) {
            return Some(BarPart::RightHandle);
        }
        if self.rect.contains(p) {
            return Some(BarPart::Body);
        }
        None
    }
}

/// Point-in-triangle by edge orientation; edges count as inside.
fn triangle_contains([a, b, c]: [Point; 3], p: Point) -> bool {
    let side = |from: Point, to: Point| (to.x - from.x) * (p.y - from.y) - (to.y - from.y) * (p.x - from.x);
    let (d1, d2, d3) = (side(a, b), side(b, c), side(c, a));
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Top of the bar in row `index`.
pub fn row_y(index: usize, options: &GanttOptions) -> f64 {
    options.header_height + options.padding + index as f64 * options.row_height()
}

/// Fill width for `progress` percent of `width`; zero when progress is absent or NaN.
pub fn progress_width(width: f64, progress: Option<f64>) -> f64 {
    match progress {
        Some(p) if p.is_finite() => width * (p / 100.0),
        _ => 0.0,
    }
}

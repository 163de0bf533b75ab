//! Pointer gesture state machine: move, resize, progress and connect drags.
//!
//! A gesture lives in a session created on pointer-down and consumed on
//! pointer-up, wherever the pointer is released. Nothing outlives the gesture
//! except the per-bar popup cool-downs.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::chart::{Chart, Hit};
use crate::events::GanttEvent;
use crate::layout::bar::row_y;
use crate::layout::{Arrow, BarPart, Point, MIN_BAR_WIDTH};

/// How long popups stay suppressed on a bar after it was manipulated.
pub const ACTION_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging,
    ResizingLeft,
    ResizingRight,
    ResizingProgress,
    Connecting,
}

/// Geometry of one bar when the gesture began, and where it will land.
#[derive(Debug, Clone, PartialEq)]
struct BarSnapshot {
    id: String,
    ox: f64,
    oy: f64,
    owidth: f64,
    final_x: f64,
    final_y: f64,
    final_width: f64,
}

impl BarSnapshot {
    fn capture(chart: &Chart, id: &str) -> Option<Self> {
        let rect = chart.bar(id)?.rect;
        Some(Self {
            id: id.to_string(),
            ox: rect.x,
            oy: rect.y,
            owidth: rect.width,
            final_x: rect.x,
            final_y: rect.y,
            final_width: rect.width,
        })
    }

    fn moved(&self) -> bool {
        self.final_x != self.ox || self.final_width != self.owidth
    }

    /// Narrowest this bar may become; bars already narrower keep their width.
    fn width_floor(&self) -> f64 {
        MIN_BAR_WIDTH.min(self.owidth)
    }
}

#[derive(Debug, Clone)]
enum Gesture {
    Drag {
        primary: BarSnapshot,
        dependents: Vec<BarSnapshot>,
        /// Set when the primary bar strayed a full bar height from its row.
        pending_reorder: bool,
    },
    ResizeLeft(BarSnapshot),
    ResizeRight(BarSnapshot),
    Progress {
        id: String,
        origin_width: f64,
        min_dx: f64,
        max_dx: f64,
        final_dx: f64,
    },
    Connect(Arrow),
}

#[derive(Debug, Clone)]
struct Session {
    origin: Point,
    gesture: Gesture,
}

impl Session {
    fn state(&self) -> InteractionState {
        match self.gesture {
            Gesture::Drag { .. } => InteractionState::Dragging,
            Gesture::ResizeLeft(_) => InteractionState::ResizingLeft,
            Gesture::ResizeRight(_) => InteractionState::ResizingRight,
            Gesture::Progress { .. } => InteractionState::ResizingProgress,
            Gesture::Connect(_) => InteractionState::Connecting,
        }
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    session: Option<Session>,
    cooldowns: HashMap<String, Instant>,
}

impl Controller {
    pub fn state(&self) -> InteractionState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or_default()
    }

    /// The arrow being drawn by a connect gesture.
    pub fn transient_arrow(&self) -> Option<&Arrow> {
        match &self.session {
            Some(Session {
                gesture: Gesture::Connect(arrow),
                ..
            }) => Some(arrow),
            _ => None,
        }
    }

    /// True while a bar is being moved or resized.
    pub fn bar_in_motion(&self) -> bool {
        matches!(
            self.state(),
            InteractionState::Dragging | InteractionState::ResizingLeft | InteractionState::ResizingRight
        )
    }

    /// Whether a click on `id` must not open the popup at `now`.
    pub fn popup_suppressed(&self, id: &str, now: Instant) -> bool {
        self.bar_in_motion()
            || self
                .cooldowns
                .get(id)
                .is_some_and(|until| now < *until)
    }

    fn start_cooldown(&mut self, id: &str, now: Instant) {
        self.cooldowns.retain(|_, until| now < *until);
        self.cooldowns.insert(id.to_string(), now + ACTION_COOLDOWN);
    }

    pub fn pointer_down(&mut self, chart: &mut Chart, p: Point) -> InteractionState {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return self.state();
        }
        self.session = None;
        match chart.hit_test(p) {
            Some(Hit::Bar { id, part }) => {
                chart.selection.bars.insert(id.clone());
                if let Some(gesture) = start_gesture(chart, &id, part, p) {
                    self.session = Some(Session { origin: p, gesture });
                }
            }
            Some(Hit::Arrow { from, to }) => {
                let _ = chart.select_arrow(&from, &to);
            }
            Some(Hit::Grid) | None => chart.unselect_all(),
        }
        let state = self.state();
        trace!(?state, x = p.x, y = p.y, "pointer down");
        state
    }

    pub fn pointer_move(&mut self, chart: &mut Chart, p: Point) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !(p.x.is_finite() && p.y.is_finite()) {
            return;
        }
        let dx = p.x - session.origin.x;
        let dy = p.y - session.origin.y;

        match &mut session.gesture {
            Gesture::Drag {
                primary,
                dependents,
                pending_reorder,
            } => {
                let snapped = chart.timeline.snap_offset(dx);
                let sortable = chart.options.sortable;
                let min_y = chart.options.header_height;
                let max_y = min_y + chart.tasks.len() as f64 * chart.options.row_height();
                let y = (primary.oy + dy).clamp(min_y, max_y);

                primary.final_x = primary.ox + snapped;
                move_bar(chart, &primary.id, Some(primary.ox + dx), sortable.then_some(y), None);
                for bar in dependents.iter_mut() {
                    bar.final_x = bar.ox + snapped;
                    move_bar(chart, &bar.id, Some(bar.ox + dx), None, None);
                }

                let final_dy = primary.final_y - primary.oy;
                if sortable && (dy - final_dy).abs() > chart.options.bar_height {
                    *pending_reorder = true;
                }
                if std::mem::take(pending_reorder) {
                    apply_reorder(chart, primary);
                }
            }
            Gesture::ResizeLeft(bar) => {
                let max_dx = bar.owidth - bar.width_floor();
                let unit = chart.timeline.snap_unit();
                let mut snapped = chart.timeline.snap_offset(dx);
                if snapped > max_dx {
                    snapped = (max_dx / unit).floor() * unit;
                }
                bar.final_x = bar.ox + snapped;
                bar.final_width = bar.owidth - snapped;
                let live = dx.min(max_dx);
                resize_left(chart, bar, bar.owidth - live);
            }
            Gesture::ResizeRight(bar) => {
                let min_dx = bar.width_floor() - bar.owidth;
                let unit = chart.timeline.snap_unit();
                let mut snapped = chart.timeline.snap_offset(dx);
                if snapped < min_dx {
                    snapped = -((-min_dx / unit).floor() * unit);
                }
                bar.final_width = bar.owidth + snapped;
                move_bar(chart, &bar.id, None, None, Some(bar.owidth + dx.max(min_dx)));
            }
            Gesture::Progress {
                id,
                origin_width,
                min_dx,
                max_dx,
                final_dx,
            } => {
                let dx = dx.clamp(*min_dx, *max_dx);
                if let Some(bar) = chart.bar_mut(id) {
                    bar.progress_width = *origin_width + dx;
                }
                *final_dx = dx;
            }
            Gesture::Connect(arrow) => {
                track_connect(chart, arrow, p);
                return;
            }
        }
        chart.reroute_arrows();
    }

    /// Finish the gesture and commit it. Returns the events fired, in order.
    pub fn pointer_up(&mut self, chart: &mut Chart, p: Point, now: Instant) -> Vec<GanttEvent> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        trace!(state = ?session.state(), x = p.x, y = p.y, "pointer up");

        let mut events = Vec::new();
        match session.gesture {
            Gesture::Drag { primary, dependents, .. } => {
                let sortable = chart.options.sortable;
                let primary_y = primary.final_y;
                let primary_id = primary.id.clone();
                let bars: Vec<BarSnapshot> = std::iter::once(primary).chain(dependents).collect();
                self.commit_bars(chart, &bars, now, &mut events);
                if sortable {
                    move_bar(chart, &primary_id, None, Some(primary_y), None);
                }
                chart.update_gantt_dates();
            }
            Gesture::ResizeLeft(bar) | Gesture::ResizeRight(bar) => {
                self.commit_bars(chart, std::slice::from_ref(&bar), now, &mut events);
                chart.update_gantt_dates();
            }
            Gesture::Progress {
                id,
                origin_width,
                final_dx,
                ..
            } => {
                chart.selection.bars.remove(&id);
                if final_dx != 0.0 {
                    events.extend(chart.commit_progress(&id, origin_width + final_dx));
                    self.start_cooldown(&id, now);
                }
            }
            Gesture::Connect(arrow) => {
                chart.selection.bars.remove(&arrow.from);
                match arrow.promote() {
                    Ok((from, to)) => {
                        if let Err(err) = chart.add_dependency(&from, &to) {
                            warn!(%err, "connect gesture dropped");
                        }
                    }
                    Err(_) => trace!(from = %arrow.from, "connect released over no bar"),
                }
            }
        }
        events
    }

    fn commit_bars(
        &mut self,
        chart: &mut Chart,
        bars: &[BarSnapshot],
        now: Instant,
        events: &mut Vec<GanttEvent>,
    ) {
        for bar in bars {
            chart.selection.bars.remove(&bar.id);
            if !bar.moved() {
                continue;
            }
            move_bar(chart, &bar.id, Some(bar.final_x), None, Some(bar.final_width));
            events.extend(chart.commit_bar_dates(&bar.id, bar.final_x, bar.final_width));
            self.start_cooldown(&bar.id, now);
        }
    }
}

fn start_gesture(chart: &Chart, id: &str, part: BarPart, p: Point) -> Option<Gesture> {
    let bar = chart.bar(id)?;
    let gesture = match part {
        BarPart::Body => {
            if !chart.options.drag_enabled || bar.invalid {
                return None;
            }
            let primary = BarSnapshot::capture(chart, id)?;
            let dependents = chart
                .index
                .transitive_dependents(id)
                .iter()
                .filter_map(|dep| BarSnapshot::capture(chart, dep))
                .collect();
            Gesture::Drag {
                primary,
                dependents,
                pending_reorder: false,
            }
        }
        BarPart::LeftHandle => Gesture::ResizeLeft(BarSnapshot::capture(chart, id)?),
        BarPart::RightHandle => Gesture::ResizeRight(BarSnapshot::capture(chart, id)?),
        BarPart::ProgressHandle => Gesture::Progress {
            id: id.to_string(),
            origin_width: bar.progress_width,
            min_dx: -bar.progress_width,
            max_dx: bar.rect.width - bar.progress_width,
            final_dx: 0.0,
        },
        BarPart::Connector => {
            let mut arrow = Arrow::free(id, bar.rect, p.x, p.y, &chart.options).ok()?;
            arrow.connecting = true;
            Gesture::Connect(arrow)
        }
    };
    Some(gesture)
}

fn move_bar(chart: &mut Chart, id: &str, x: Option<f64>, y: Option<f64>, width: Option<f64>) {
    let Some(pos) = chart.position(id) else {
        return;
    };
    let progress = chart.tasks[pos].progress;
    chart.bars[pos].set_position(x, y, width, progress);
}

/// Resize keeping the right edge fixed. Widths the bar refuses leave x alone.
fn resize_left(chart: &mut Chart, bar: &BarSnapshot, width: f64) {
    let right = bar.ox + bar.owidth;
    move_bar(chart, &bar.id, None, None, Some(width));
    if let Some(applied) = chart.bar(&bar.id).map(|b| b.rect.width) {
        move_bar(chart, &bar.id, Some(right - applied), None, None);
    }
}

/// Re-sort rows under the dragged bar. The dragged bar keeps following the
/// pointer; its committed y becomes its new row.
fn apply_reorder(chart: &mut Chart, primary: &mut BarSnapshot) {
    let changed: HashSet<String> = chart.sort_rows_by_y().into_iter().collect();
    for pos in 0..chart.tasks.len() {
        let y = row_y(pos, &chart.options);
        let id = chart.tasks[pos].id.clone();
        if id == primary.id {
            primary.final_y = y;
        } else if changed.contains(&id) {
            move_bar(chart, &id, None, Some(y), None);
        }
    }
}

fn track_connect(chart: &Chart, arrow: &mut Arrow, p: Point) {
    let Some(from_rect) = chart.bar(&arrow.from).map(|b| b.rect) else {
        return;
    };
    let target = match chart.hit_test(p) {
        Some(Hit::Bar { id, .. }) if id != arrow.from => chart
            .bar(&id)
            .filter(|b| !b.invalid)
            .map(|b| (id.clone(), b.rect)),
        _ => None,
    };
    match target {
        Some((to, to_rect)) => arrow.update_to_task(to, from_rect, to_rect, &chart.options),
        None => {
            let _ = arrow.update_end_xy(p.x, p.y, from_rect, &chart.options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;
    use crate::model::{GanttOptions, TaskInput};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        calendar::parse(s).unwrap()
    }

    fn chart_with(options: GanttOptions) -> Chart {
        let inputs = vec![
            TaskInput::new("a", "A").dates("2024-01-01", "2024-01-03").progress(50.0),
            TaskInput::new("b", "B").dates("2024-01-04", "2024-01-05").depends_on(["a"]),
            TaskInput::new("c", "C").dates("2024-01-06", "2024-01-07"),
        ];
        Chart::new(inputs, options, dt("2024-01-02")).unwrap()
    }

    fn body(chart: &Chart, id: &str) -> Point {
        // Upper half, clear of the progress handle.
        let r = chart.bar(id).unwrap().rect;
        Point::new(r.x + r.width / 2.0, r.y + 5.0)
    }

    #[test]
    fn body_press_starts_drag_with_dependents() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let p = body(&chart, "a");
        assert_eq!(ctl.pointer_down(&mut chart, p), InteractionState::Dragging);
        let b_x = chart.bar("b").unwrap().rect.x;
        let c_x = chart.bar("c").unwrap().rect.x;
        ctl.pointer_move(&mut chart, Point::new(p.x + 30.0, p.y));
        assert_eq!(chart.bar("b").unwrap().rect.x, b_x + 30.0);
        assert_eq!(chart.bar("c").unwrap().rect.x, c_x);
        assert!(ctl.popup_suppressed("c", Instant::now()));
    }

    #[test]
    fn drag_disabled_leaves_state_idle() {
        let options = GanttOptions {
            drag_enabled: false,
            ..GanttOptions::default()
        };
        let mut chart = chart_with(options);
        let mut ctl = Controller::default();
        let p = body(&chart, "a");
        assert_eq!(ctl.pointer_down(&mut chart, p), InteractionState::Idle);
        assert!(chart.selection.bars.contains("a"));
    }

    #[test]
    fn release_commits_snapped_position_and_cools_down() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let p = body(&chart, "c");
        ctl.pointer_down(&mut chart, p);
        ctl.pointer_move(&mut chart, Point::new(p.x + 70.0, p.y));
        let now = Instant::now();
        let events = ctl.pointer_up(&mut chart, Point::new(p.x + 70.0, p.y), now);
        assert_eq!(
            events,
            vec![GanttEvent::DateChange {
                task_id: "c".into(),
                start: dt("2024-01-07"),
                end: dt("2024-01-09"),
            }]
        );
        assert_eq!(ctl.state(), InteractionState::Idle);
        assert!(ctl.popup_suppressed("c", now + Duration::from_millis(500)));
        assert!(!ctl.popup_suppressed("c", now + ACTION_COOLDOWN));
        assert!(!chart.selection.bars.contains("c"));
    }

    #[test]
    fn left_resize_snaps_and_respects_width_floor() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let r = chart.bar("a").unwrap().rect;
        let handle = Point::new(r.x + 4.0, r.y + 10.0);
        assert_eq!(ctl.pointer_down(&mut chart, handle), InteractionState::ResizingLeft);
        ctl.pointer_move(&mut chart, Point::new(handle.x + 400.0, handle.y));
        let live = chart.bar("a").unwrap().rect;
        assert_eq!(live.width, MIN_BAR_WIDTH);
        assert_eq!(live.end_x(), r.end_x());
        let events = ctl.pointer_up(&mut chart, Point::new(handle.x + 400.0, handle.y), Instant::now());
        // 150px bar, floor 19px: the largest whole-column shrink is 100px.
        assert_eq!(
            events,
            vec![GanttEvent::DateChange {
                task_id: "a".into(),
                start: dt("2024-01-03"),
                end: dt("2024-01-04"),
            }]
        );
        assert_eq!(chart.task("b").unwrap().start, dt("2024-01-04"));
    }

    #[test]
    fn right_resize_extends_end_only() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let r = chart.bar("c").unwrap().rect;
        let handle = Point::new(r.end_x() - 4.0, r.y + 10.0);
        assert_eq!(ctl.pointer_down(&mut chart, handle), InteractionState::ResizingRight);
        ctl.pointer_move(&mut chart, Point::new(handle.x + 110.0, handle.y));
        let events = ctl.pointer_up(&mut chart, Point::new(handle.x + 110.0, handle.y), Instant::now());
        assert_eq!(
            events,
            vec![GanttEvent::DateChange {
                task_id: "c".into(),
                start: dt("2024-01-06"),
                end: dt("2024-01-10"),
            }]
        );
    }

    #[test]
    fn progress_drag_is_clamped_to_bar() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let r = chart.bar("a").unwrap().rect;
        let handle = Point::new(r.x + 75.0, r.bottom() - 2.0);
        assert_eq!(ctl.pointer_down(&mut chart, handle), InteractionState::ResizingProgress);
        ctl.pointer_move(&mut chart, Point::new(handle.x + 1000.0, handle.y));
        assert_eq!(chart.bar("a").unwrap().progress_width, 150.0);
        let events = ctl.pointer_up(&mut chart, handle, Instant::now());
        assert_eq!(
            events,
            vec![GanttEvent::ProgressChange { task_id: "a".into(), progress: 100 }]
        );
        assert!(chart.selection().is_empty());
    }

    #[test]
    fn untouched_progress_handle_fires_nothing() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let r = chart.bar("a").unwrap().rect;
        let handle = Point::new(r.x + 75.0, r.bottom() - 2.0);
        ctl.pointer_down(&mut chart, handle);
        assert!(ctl.pointer_up(&mut chart, handle, Instant::now()).is_empty());
    }

    #[test]
    fn connect_binds_to_other_bar_and_adds_dependency() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let c = chart.bar("a").unwrap().connector().unwrap();
        let start = Point::new(c.cx, c.cy);
        assert_eq!(ctl.pointer_down(&mut chart, start), InteractionState::Connecting);

        ctl.pointer_move(&mut chart, Point::new(start.x + 5.0, 400.0));
        assert!(ctl.transient_arrow().unwrap().to().is_none());

        let target = body(&chart, "c");
        ctl.pointer_move(&mut chart, target);
        let arrow = ctl.transient_arrow().unwrap();
        assert_eq!(arrow.to(), Some("c"));
        assert!(matches!(arrow.marker(20.0), crate::layout::ArrowMarker::Circle { .. }));

        assert!(ctl.pointer_up(&mut chart, target, Instant::now()).is_empty());
        assert!(ctl.transient_arrow().is_none());
        assert_eq!(chart.task("c").unwrap().dependencies, ["a"]);
        assert_eq!(chart.index().dependents_of("a"), ["b", "c"]);
        assert_eq!(chart.arrows().len(), 2);
        assert!(chart.selection().is_empty());
    }

    #[test]
    fn connect_released_on_empty_space_is_discarded() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        let c = chart.bar("a").unwrap().connector().unwrap();
        ctl.pointer_down(&mut chart, Point::new(c.cx, c.cy));
        ctl.pointer_move(&mut chart, Point::new(c.cx + 300.0, 900.0));
        ctl.pointer_up(&mut chart, Point::new(c.cx + 300.0, 900.0), Instant::now());
        assert_eq!(chart.index().edge_count(), 1);
        assert_eq!(chart.arrows().len(), 1);
    }

    #[test]
    fn sortable_drag_reorders_rows() {
        let options = GanttOptions {
            sortable: true,
            ..GanttOptions::default()
        };
        let mut chart = chart_with(options);
        let mut ctl = Controller::default();
        let p = body(&chart, "a");
        ctl.pointer_down(&mut chart, p);
        // Two and a half rows down: past both b and c.
        let to = Point::new(p.x, p.y + 95.0);
        ctl.pointer_move(&mut chart, to);
        let order: Vec<&str> = chart.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(chart.bar("b").unwrap().rect.y, 68.0);
        assert_eq!(chart.bar("c").unwrap().rect.y, 106.0);
        // The dragged bar still follows the pointer until release.
        assert_eq!(chart.bar("a").unwrap().rect.y, 68.0 + 95.0);

        let events = ctl.pointer_up(&mut chart, to, Instant::now());
        assert!(events.is_empty());
        assert_eq!(chart.task("a").unwrap().index, 2);
        assert_eq!(chart.bar("a").unwrap().rect.y, 144.0);
    }

    #[test]
    fn grid_press_clears_selection() {
        let mut chart = chart_with(GanttOptions::default());
        let mut ctl = Controller::default();
        chart.select_bar("a").unwrap();
        assert_eq!(ctl.pointer_down(&mut chart, Point::new(2.0, 60.0)), InteractionState::Idle);
        assert!(chart.selection().is_empty());
    }
}

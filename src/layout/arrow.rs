use std::f64::consts::TAU;
use std::fmt::Write as _;

use serde::Serialize;

use super::{Point, Rect};
use crate::error::{GanttError, Result};
use crate::model::GanttOptions;

/// Horizontal step used to walk the start point left when the target overlaps.
const START_SHIFT: f64 = 10.0;
/// Size of the arrowhead chevron.
const CHEVRON: f64 = 5.0;
/// Points per quarter-circle when flattening arcs.
const ARC_SAMPLES: usize = 8;

/// One path command. Lower-case SVG commands are the `*By` variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathSegment {
    MoveTo(Point),
    MoveBy { dx: f64, dy: f64 },
    LineTo(Point),
    LineBy { dx: f64, dy: f64 },
    HorizontalTo(f64),
    VerticalTo(f64),
    VerticalBy(f64),
    /// Quarter-circle arc to a relative end point.
    ArcBy { radius: f64, sweep: u8, dx: f64, dy: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowPath {
    pub segments: Vec<PathSegment>,
    pub start: Point,
    pub end: Point,
    /// Arc sweep flag: 1 when the source sits below the destination.
    pub sweep: u8,
    /// Signed vertical extent of each arc.
    pub curve_y: f64,
    /// The elbow route taken when the destination lies left of the source.
    pub rerouted: bool,
}

/// Where an arrow is routed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteTarget {
    Bar(Rect),
    Point(Point),
}

/// Route a dependency arrow from the bottom centre of `from` to `target`.
pub fn route(from: Rect, target: RouteTarget, padding: f64, curve: f64) -> ArrowPath {
    let mut start_x = from.x + from.width / 2.0;
    let start_y = from.bottom();
    let end = match target {
        RouteTarget::Bar(to) => Point::new(to.x - padding / 2.0, to.y + to.height / 2.0),
        RouteTarget::Point(p) => p,
    };

    while end.x < start_x + padding && start_x > from.x + padding {
        start_x -= START_SHIFT;
    }

    let below = start_y > end.y;
    let sweep = u8::from(below);
    let curve_y = if below { -curve } else { curve };
    let start = Point::new(start_x, start_y);

    let rerouted = end.x < from.x + padding;
    let mut segments = vec![PathSegment::MoveTo(start)];
    if rerouted {
        let down_1 = padding / 2.0 - curve;
        let down_2 = end.y - curve_y;
        let left = end.x - padding;
        segments.extend([
            PathSegment::VerticalBy(down_1),
            PathSegment::ArcBy { radius: curve, sweep: 1, dx: -curve, dy: curve },
            PathSegment::HorizontalTo(left),
            PathSegment::ArcBy { radius: curve, sweep, dx: -curve, dy: curve_y },
            PathSegment::VerticalTo(down_2),
            PathSegment::ArcBy { radius: curve, sweep, dx: curve, dy: curve_y },
        ]);
    } else {
        let offset = if below { end.y + curve } else { end.y - curve };
        segments.extend([
            PathSegment::VerticalTo(offset),
            PathSegment::ArcBy { radius: curve, sweep, dx: curve, dy: curve_y },
        ]);
    }
    segments.extend([
        PathSegment::LineTo(end),
        PathSegment::MoveBy { dx: -CHEVRON, dy: -CHEVRON },
        PathSegment::LineBy { dx: CHEVRON, dy: CHEVRON },
        PathSegment::LineBy { dx: -CHEVRON, dy: CHEVRON },
    ]);

    ArrowPath {
        segments,
        start,
        end,
        sweep,
        curve_y,
        rerouted,
    }
}

impl ArrowPath {
    /// SVG path data.
    pub fn to_svg(&self) -> String {
        let mut d = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                d.push(' ');
            }
            let _ = match *segment {
                PathSegment::MoveTo(p) => write!(d, "M {} {}", p.x, p.y),
                PathSegment::MoveBy { dx, dy } => write!(d, "m {dx} {dy}"),
                PathSegment::LineTo(p) => write!(d, "L {} {}", p.x, p.y),
                PathSegment::LineBy { dx, dy } => write!(d, "l {dx} {dy}"),
                PathSegment::HorizontalTo(x) => write!(d, "H {x}"),
                PathSegment::VerticalTo(y) => write!(d, "V {y}"),
                PathSegment::VerticalBy(dy) => write!(d, "v {dy}"),
                PathSegment::ArcBy { radius, sweep, dx, dy } => {
                    write!(d, "a {radius} {radius} 0 0 {sweep} {dx} {dy}")
                }
            };
        }
        d
    }

    /// The path as polylines, one per move command, with arcs sampled.
    pub fn flatten(&self) -> Vec<Vec<Point>> {
        let mut lines: Vec<Vec<Point>> = Vec::new();
        let mut pen = Point::default();
        for segment in &self.segments {
            let next = match *segment {
                PathSegment::MoveTo(p) => {
                    lines.push(vec![p]);
                    pen = p;
                    continue;
                }
                PathSegment::MoveBy { dx, dy } => {
                    pen = Point::new(pen.x + dx, pen.y + dy);
                    lines.push(vec![pen]);
                    continue;
                }
                PathSegment::LineTo(p) => p,
                PathSegment::LineBy { dx, dy } => Point::new(pen.x + dx, pen.y + dy),
                PathSegment::HorizontalTo(x) => Point::new(x, pen.y),
                PathSegment::VerticalTo(y) => Point::new(pen.x, y),
                PathSegment::VerticalBy(dy) => Point::new(pen.x, pen.y + dy),
                PathSegment::ArcBy { sweep, dx, dy, .. } => {
                    let line = current_line(&mut lines, pen);
                    line.extend(sample_arc(pen, sweep, dx, dy));
                    pen = Point::new(pen.x + dx, pen.y + dy);
                    continue;
                }
            };
            current_line(&mut lines, pen).push(next);
            pen = next;
        }
        lines
    }

    /// Shortest distance from `p` to any drawn part of the path.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.flatten()
            .iter()
            .flat_map(|line| line.windows(2).map(|w| segment_distance(p, w[0], w[1])))
            .fold(f64::INFINITY, f64::min)
    }
}

fn current_line(lines: &mut Vec<Vec<Point>>, pen: Point) -> &mut Vec<Point> {
    if lines.is_empty() {
        lines.push(vec![pen]);
    }
    let last = lines.len() - 1;
    &mut lines[last]
}

/// Points along a quarter-circle from `from` to `from + (dx, dy)`, excluding
/// `from`. Sweep 1 runs with increasing angle (clockwise on screen).
fn sample_arc(from: Point, sweep: u8, dx: f64, dy: f64) -> Vec<Point> {
    let end = Point::new(from.x + dx, from.y + dy);
    if dx == 0.0 || dy == 0.0 {
        return vec![end];
    }
    let center = if (sweep == 1) == (dx * dy < 0.0) {
        Point::new(from.x + dx, from.y)
    } else {
        Point::new(from.x, from.y + dy)
    };
    let radius = center.distance(from);
    let a0 = (from.y - center.y).atan2(from.x - center.x);
    let a1 = (end.y - center.y).atan2(end.x - center.x);
    let mut delta = (a1 - a0).rem_euclid(TAU);
    if sweep == 0 {
        delta -= TAU;
    }
    (1..=ARC_SAMPLES)
        .map(|i| {
            if i == ARC_SAMPLES {
                return end;
            }
            let a = a0 + delta * i as f64 / ARC_SAMPLES as f64;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * vx, a.y + t * vy))
}

/// Destination of an arrow: a task while bound, a raw point while the user
/// is still dragging a new link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArrowEnd {
    Bound { to: String },
    Free { x: f64, y: f64 },
}

/// What to draw at the arrow's end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ArrowMarker {
    Chevron,
    /// Shown while a live connect drag has latched onto a target bar.
    Circle {
        center: Point,
        outer_radius: f64,
        inner_radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub end: ArrowEnd,
    pub path: ArrowPath,
    /// Part of an in-progress connect gesture.
    pub connecting: bool,
}

impl Arrow {
    pub fn bound(
        from: impl Into<String>,
        from_rect: Rect,
        to: impl Into<String>,
        to_rect: Rect,
        options: &GanttOptions,
    ) -> Self {
        Self {
            from: from.into(),
            end: ArrowEnd::Bound { to: to.into() },
            path: route(from_rect, RouteTarget::Bar(to_rect), options.padding, options.arrow_curve),
            connecting: false,
        }
    }

    pub fn free(
        from: impl Into<String>,
        from_rect: Rect,
        x: f64,
        y: f64,
        options: &GanttOptions,
    ) -> Result<Self> {
        check_endpoint(x, y)?;
        Ok(Self {
            from: from.into(),
            end: ArrowEnd::Free { x, y },
            path: route(
                from_rect,
                RouteTarget::Point(Point::new(x, y)),
                options.padding,
                options.arrow_curve,
            ),
            connecting: false,
        })
    }

    /// `"from,to"` when bound, `"from,,x,y"` when free.
    pub fn id(&self) -> String {
        match &self.end {
            ArrowEnd::Bound { to } => format!("{},{}", self.from, to),
            ArrowEnd::Free { x, y } => format!("{},,{},{}", self.from, x, y),
        }
    }

    pub fn to(&self) -> Option<&str> {
        match &self.end {
            ArrowEnd::Bound { to } => Some(to),
            ArrowEnd::Free { .. } => None,
        }
    }

    pub fn links(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to() == Some(to)
    }

    pub fn update_to_task(
        &mut self,
        to: impl Into<String>,
        from_rect: Rect,
        to_rect: Rect,
        options: &GanttOptions,
    ) {
        self.end = ArrowEnd::Bound { to: to.into() };
        self.path = route(from_rect, RouteTarget::Bar(to_rect), options.padding, options.arrow_curve);
    }

    pub fn update_end_xy(&mut self, x: f64, y: f64, from_rect: Rect, options: &GanttOptions) -> Result<()> {
        check_endpoint(x, y)?;
        self.end = ArrowEnd::Free { x, y };
        self.path = route(
            from_rect,
            RouteTarget::Point(Point::new(x, y)),
            options.padding,
            options.arrow_curve,
        );
        Ok(())
    }

    /// Re-route after the source (and, when bound, the target) moved.
    pub fn reroute(&mut self, from_rect: Rect, to_rect: Option<Rect>, options: &GanttOptions) {
        let target = match (&self.end, to_rect) {
            (ArrowEnd::Bound { .. }, Some(rect)) => RouteTarget::Bar(rect),
            (ArrowEnd::Free { x, y }, _) => RouteTarget::Point(Point::new(*x, *y)),
            (ArrowEnd::Bound { to }, None) => {
                tracing::warn!(from = %self.from, to = %to, "arrow target has no bar");
                return;
            }
        };
        self.path = route(from_rect, target, options.padding, options.arrow_curve);
    }

    /// The dependency edge this arrow stands for, as `(from, to)`.
    pub fn promote(&self) -> Result<(String, String)> {
        match &self.end {
            ArrowEnd::Bound { to } => Ok((self.from.clone(), to.clone())),
            ArrowEnd::Free { .. } => Err(GanttError::ArrowWithoutTarget(self.from.clone())),
        }
    }

    pub fn marker(&self, bar_height: f64) -> ArrowMarker {
        match self.end {
            ArrowEnd::Bound { .. } if self.connecting => ArrowMarker::Circle {
                center: self.path.end,
                outer_radius: bar_height / 2.0,
                inner_radius: 2.0,
            },
            _ => ArrowMarker::Chevron,
        }
    }
}

fn check_endpoint(x: f64, y: f64) -> Result<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(GanttError::InvalidEndpoint { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PADDING: f64 = 18.0;
    const CURVE: f64 = 5.0;

    #[test]
    fn default_route_drops_then_turns_toward_target() {
        let from = Rect::new(0.0, 68.0, 150.0, 20.0);
        let to = Rect::new(200.0, 106.0, 150.0, 20.0);
        let path = route(from, RouteTarget::Bar(to), PADDING, CURVE);
        assert!(!path.rerouted);
        assert_eq!(path.start, Point::new(75.0, 88.0));
        assert_eq!(path.end, Point::new(191.0, 116.0));
        assert_eq!(
            path.to_svg(),
            "M 75 88 V 111 a 5 5 0 0 0 5 5 L 191 116 m -5 -5 l 5 5 l -5 5"
        );
    }

    #[test]
    fn start_walks_left_when_target_overlaps() {
        let from = Rect::new(0.0, 68.0, 150.0, 20.0);
        let to = Rect::new(50.0, 106.0, 150.0, 20.0);
        let path = route(from, RouteTarget::Bar(to), PADDING, CURVE);
        // end.x = 41; 75 walks down to 15, the first value not right of from.x + padding.
        assert_eq!(path.start.x, 15.0);
        assert!(path.start.x <= from.x + PADDING || path.start.x + PADDING <= path.end.x);
        assert!(!path.rerouted);
    }

    #[test]
    fn target_left_of_source_takes_elbow() {
        let from = Rect::new(300.0, 68.0, 100.0, 20.0);
        let to = Rect::new(100.0, 106.0, 100.0, 20.0);
        let path = route(from, RouteTarget::Bar(to), PADDING, CURVE);
        assert!(path.rerouted);
        assert_eq!(path.start.x, 310.0);
        assert_eq!(
            path.to_svg(),
            "M 310 88 v 4 a 5 5 0 0 1 -5 5 H 73 a 5 5 0 0 0 -5 5 V 111 a 5 5 0 0 0 5 5 L 91 116 m -5 -5 l 5 5 l -5 5"
        );
    }

    #[test]
    fn sweep_and_curve_sign_mirror_vertical_order() {
        let upper = Rect::new(0.0, 68.0, 100.0, 20.0);
        let lower = Rect::new(200.0, 144.0, 100.0, 20.0);
        let down = route(upper, RouteTarget::Bar(lower), PADDING, CURVE);
        assert_eq!((down.sweep, down.curve_y), (0, CURVE));

        let up = route(lower, RouteTarget::Bar(Rect::new(400.0, 68.0, 100.0, 20.0)), PADDING, CURVE);
        assert_eq!((up.sweep, up.curve_y), (1, -CURVE));
        assert!(up.to_svg().contains("a 5 5 0 0 1 5 -5"));
    }

    #[test]
    fn flattened_arcs_are_continuous() {
        let from = Rect::new(300.0, 68.0, 100.0, 20.0);
        let to = Rect::new(100.0, 144.0, 100.0, 20.0);
        let path = route(from, RouteTarget::Bar(to), PADDING, CURVE);
        let lines = path.flatten();
        assert_eq!(lines.len(), 2);
        let body = &lines[0];
        assert_eq!(body.first(), Some(&path.start));
        assert_eq!(body.last(), Some(&path.end));
        assert!(body.windows(2).all(|w| w[0].distance(w[1]) <= CURVE + 1e-9 || w[0].y == w[1].y || w[0].x == w[1].x));
        // The chevron starts five pixels up and left of the end.
        assert_eq!(lines[1][0], Point::new(path.end.x - 5.0, path.end.y - 5.0));
    }

    #[test]
    fn arc_samples_stay_on_the_circle() {
        // Heading down then turning right: centre is to the right of the start.
        let pts = sample_arc(Point::new(0.0, 0.0), 0, 5.0, 5.0);
        let center = Point::new(5.0, 0.0);
        assert!(pts.iter().all(|p| (p.distance(center) - 5.0).abs() < 1e-9));
        assert_eq!(pts.last(), Some(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn distance_to_path() {
        let from = Rect::new(0.0, 68.0, 150.0, 20.0);
        let to = Rect::new(200.0, 106.0, 150.0, 20.0);
        let path = route(from, RouteTarget::Bar(to), PADDING, CURVE);
        assert!(path.distance_to(Point::new(75.0, 100.0)) < 1e-9);
        assert!((path.distance_to(Point::new(130.0, 120.0)) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn free_arrow_promotion_fails_until_bound() {
        let options = GanttOptions::default();
        let from = Rect::new(0.0, 68.0, 150.0, 20.0);
        let mut arrow = Arrow::free("a", from, 300.0, 200.0, &options).unwrap();
        assert_eq!(arrow.id(), "a,,300,200");
        assert!(matches!(arrow.promote(), Err(GanttError::ArrowWithoutTarget(_))));
        assert_eq!(arrow.marker(20.0), ArrowMarker::Chevron);

        arrow.connecting = true;
        arrow.update_to_task("b", from, Rect::new(200.0, 106.0, 100.0, 20.0), &options);
        assert_eq!(arrow.id(), "a,b");
        assert_eq!(arrow.promote().unwrap(), ("a".to_string(), "b".to_string()));
        assert_eq!(
            arrow.marker(20.0),
            ArrowMarker::Circle { center: Point::new(191.0, 116.0), outer_radius: 10.0, inner_radius: 2.0 }
        );
    }

    #[test]
    fn non_finite_endpoints_are_rejected() {
        let options = GanttOptions::default();
        let from = Rect::new(0.0, 68.0, 150.0, 20.0);
        assert!(matches!(
            Arrow::free("a", from, f64::NAN, 1.0, &options),
            Err(GanttError::InvalidEndpoint { .. })
        ));
        let mut arrow = Arrow::bound("a", from, "b", from, &options);
        assert!(arrow.update_end_xy(1.0, f64::INFINITY, from, &options).is_err());
        assert_eq!(arrow.to(), Some("b"));
    }
}

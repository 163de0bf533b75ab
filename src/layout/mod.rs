//! Pixel geometry derived from the timeline: bars, handles, arrows, grid and header.

pub mod arrow;
pub mod bar;
pub mod grid;

pub use arrow::{route, Arrow, ArrowEnd, ArrowMarker, ArrowPath, PathSegment, RouteTarget};
pub use bar::{BarLayout, BarPart, LabelPlacement, HANDLE_WIDTH, MIN_BAR_WIDTH};
pub use grid::{DateLabel, DayHighlight, GridLayout, HighlightKind, Tick};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in chart pixels, origin at the top-left of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn end_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.end_x() && p.y >= self.y && p.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Circle {
    pub fn contains(&self, p: Point) -> bool {
        Point::new(self.cx, self.cy).distance(p) <= self.r
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::task::Task;
use crate::calendar::{self, TimeUnit};
use crate::error::GanttError;

/// Named timeline resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[serde(rename = "Quarter Day")]
    QuarterDay,
    #[serde(rename = "Half Day")]
    HalfDay,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl ViewMode {
    pub const ALL: [ViewMode; 6] = [
        ViewMode::QuarterDay,
        ViewMode::HalfDay,
        ViewMode::Day,
        ViewMode::Week,
        ViewMode::Month,
        ViewMode::Year,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ViewMode::QuarterDay => "Quarter Day",
            ViewMode::HalfDay => "Half Day",
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Year => "Year",
        }
    }

    /// Hours per column and pixels per column for this mode.
    pub fn scale(self) -> ViewScale {
        let (step, column_width) = match self {
            ViewMode::QuarterDay => (24.0 / 4.0, 50.0),
            ViewMode::HalfDay => (24.0 / 2.0, 50.0),
            ViewMode::Day => (24.0, 50.0),
            ViewMode::Week => (24.0 * 7.0, 150.0),
            ViewMode::Month => (24.0 * 30.0, 150.0),
            ViewMode::Year => (24.0 * 365.0, 150.0),
        };
        ViewScale { step, column_width }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "quarterday" => Ok(ViewMode::QuarterDay),
            "halfday" => Ok(ViewMode::HalfDay),
            "day" => Ok(ViewMode::Day),
            "week" => Ok(ViewMode::Week),
            "month" => Ok(ViewMode::Month),
            "year" => Ok(ViewMode::Year),
            _ => Err(GanttError::UnknownViewMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewScale {
    /// Hours represented by one column.
    pub step: f64,
    /// Pixels per column.
    pub column_width: f64,
}

/// The padded date range of the chart, its tick list and the date <-> pixel
/// mapping for the active view mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub mode: ViewMode,
    pub step: f64,
    pub column_width: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Strictly increasing column starts; the last one is at or past `end`.
    pub ticks: Vec<NaiveDateTime>,
}

impl Timeline {
    pub fn new(mode: ViewMode, today: NaiveDateTime) -> Self {
        let scale = mode.scale();
        Self {
            mode,
            step: scale.step,
            column_width: scale.column_width,
            start: today,
            end: today,
            ticks: vec![today],
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let scale = mode.scale();
        self.mode = mode;
        self.step = scale.step;
        self.column_width = scale.column_width;
    }

    /// Rescan the tasks, pad the range for the view mode and rebuild ticks.
    pub fn recompute_range(&mut self, tasks: &[Task], today: NaiveDateTime) {
        let min_start = tasks.iter().map(|t| t.start).min().unwrap_or(today);
        let max_end = tasks.iter().map(|t| t.end).max().unwrap_or(today);

        let start = calendar::start_of(min_start, TimeUnit::Day);
        let end = calendar::start_of(max_end, TimeUnit::Day);

        let (start, end) = match self.mode {
            ViewMode::QuarterDay | ViewMode::HalfDay => (
                calendar::add(start, -7.0, TimeUnit::Day),
                calendar::add(end, 7.0, TimeUnit::Day),
            ),
            ViewMode::Month => (
                calendar::start_of(start, TimeUnit::Year),
                calendar::add(end, 1.0, TimeUnit::Year),
            ),
            ViewMode::Year => (
                calendar::add(start, -2.0, TimeUnit::Year),
                calendar::add(end, 2.0, TimeUnit::Year),
            ),
            ViewMode::Day | ViewMode::Week => (
                calendar::add(start, -1.0, TimeUnit::Month),
                calendar::add(end, 1.0, TimeUnit::Month),
            ),
        };

        self.start = start;
        self.end = end;
        self.ticks = self.build_ticks();
    }

    fn build_ticks(&self) -> Vec<NaiveDateTime> {
        let mut ticks = vec![self.start];
        let mut current = self.start;
        while current < self.end {
            let next = match self.mode {
                ViewMode::Year => calendar::add(current, 1.0, TimeUnit::Year),
                ViewMode::Month => calendar::add(current, 1.0, TimeUnit::Month),
                _ => calendar::add(current, self.step, TimeUnit::Hour),
            };
            if next <= current {
                break;
            }
            ticks.push(next);
            current = next;
        }
        ticks
    }

    /// Pixel offset of `date` from the range start. Month view prorates whole
    /// days so variable month lengths do not drift.
    pub fn date_to_x(&self, date: NaiveDateTime) -> f64 {
        match self.mode {
            ViewMode::Month => {
                let days = calendar::diff(date, self.start, TimeUnit::Day).floor();
                days * self.column_width / 30.0
            }
            _ => {
                let hours = calendar::diff(date, self.start, TimeUnit::Hour);
                hours / self.step * self.column_width
            }
        }
    }

    /// Inverse of [`Timeline::date_to_x`].
    pub fn x_to_date(&self, x: f64) -> NaiveDateTime {
        match self.mode {
            ViewMode::Month => {
                calendar::add(self.start, x * 30.0 / self.column_width, TimeUnit::Day)
            }
            _ => calendar::add(self.start, x / self.column_width * self.step, TimeUnit::Hour),
        }
    }

    /// Date at `x` for a bar laid out from `anchor`. Month view only resolves
    /// whole days, so the anchor's time of day is carried over.
    pub fn x_to_date_from(&self, x: f64, anchor: NaiveDateTime) -> NaiveDateTime {
        match self.mode {
            ViewMode::Month => {
                let laid_out = self.x_to_date(self.date_to_x(anchor));
                anchor + (self.x_to_date(x) - laid_out)
            }
            _ => self.x_to_date(x),
        }
    }

    pub fn hours_to_width(&self, hours: f64) -> f64 {
        self.column_width * hours / self.step
    }

    pub fn width_to_hours(&self, width: f64) -> f64 {
        width / self.column_width * self.step
    }

    /// Smallest horizontal movement a drag or resize commits to.
    pub fn snap_unit(&self) -> f64 {
        match self.mode {
            ViewMode::Week => self.column_width / 7.0,
            ViewMode::Month => self.column_width / 30.0,
            _ => self.column_width,
        }
    }

    /// Round a pointer offset to whole snap units; exactly half a unit or
    /// more rounds away from zero.
    pub fn snap_offset(&self, dx: f64) -> f64 {
        let unit = self.snap_unit();
        let units = (dx.abs() / unit + 0.5).floor();
        if units == 0.0 {
            return 0.0;
        }
        units.copysign(dx) * unit
    }

    /// Floor an absolute x to the snap grid.
    pub fn snap_x(&self, x: f64) -> f64 {
        x - x.rem_euclid(self.snap_unit())
    }

    /// Width of the column starting at `tick`.
    pub fn column_width_at(&self, tick: NaiveDateTime) -> f64 {
        match self.mode {
            ViewMode::Month => calendar::days_in_month(tick) as f64 * self.column_width / 30.0,
            _ => self.column_width,
        }
    }

    /// Total pixel width covered by the tick columns.
    pub fn grid_width(&self) -> f64 {
        match self.mode {
            ViewMode::Month => self.ticks.iter().map(|t| self.column_width_at(*t)).sum(),
            _ => self.ticks.len() as f64 * self.column_width,
        }
    }
}

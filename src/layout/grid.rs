use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::Serialize;

use super::Rect;
use crate::calendar::{self, TimeUnit};
use crate::model::{GanttOptions, Timeline, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub thick: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HighlightKind {
    Today,
    Holiday,
    /// A weekend day declared as a working day.
    Workday,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayHighlight {
    pub rect: Rect,
    pub kind: HighlightKind,
}

/// Header text for one tick column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateLabel {
    pub date: NaiveDateTime,
    pub column_width: f64,
    pub base_x: f64,
    pub lower_text: String,
    pub lower_x: f64,
    pub lower_y: f64,
    /// Empty when this column does not start a new upper period.
    pub upper_text: String,
    pub upper_x: f64,
    pub upper_y: f64,
    pub special_day: bool,
}

impl DateLabel {
    /// Whether an upper label of `text_width` stays inside a grid of `grid_width`.
    pub fn upper_fits(&self, text_width: f64, grid_width: f64) -> bool {
        self.upper_x + text_width / 2.0 <= grid_width
    }
}

/// Everything needed to paint the background grid and the date header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    pub width: f64,
    pub height: f64,
    pub header: Rect,
    pub rows: Vec<Rect>,
    pub row_lines: Vec<f64>,
    pub ticks: Vec<Tick>,
    /// Thick header ticks drawn at the start of each upper label period.
    pub header_ticks: Vec<Tick>,
    pub highlights: Vec<DayHighlight>,
    pub labels: Vec<DateLabel>,
}

impl GridLayout {
    pub fn compute(
        timeline: &Timeline,
        options: &GanttOptions,
        row_count: usize,
        today: NaiveDateTime,
    ) -> Self {
        let width = timeline.grid_width();
        let row_height = options.row_height();
        let height = options.header_height + options.padding + row_height * row_count as f64;

        let mut rows = Vec::with_capacity(row_count);
        let mut row_lines = Vec::with_capacity(row_count);
        let mut row_y = options.header_height + options.padding / 2.0;
        for _ in 0..row_count {
            rows.push(Rect::new(0.0, row_y, width, row_height));
            row_lines.push(row_y + row_height);
            row_y += row_height;
        }

        let labels = date_labels(timeline, options);
        let header_tick_height = options.header_height + options.padding / 2.0;
        let header_ticks = labels
            .iter()
            .filter(|l| !l.upper_text.is_empty())
            .map(|l| Tick {
                x: l.base_x,
                y: 0.0,
                height: header_tick_height,
                thick: true,
            })
            .collect();

        Self {
            width,
            height,
            header: Rect::new(0.0, 0.0, width, options.header_height + 10.0),
            rows,
            row_lines,
            ticks: ticks(timeline, options, row_count),
            header_ticks,
            highlights: highlights(timeline, options, row_count, today),
            labels,
        }
    }
}

fn ticks(timeline: &Timeline, options: &GanttOptions, row_count: usize) -> Vec<Tick> {
    let y = options.header_height + options.padding / 2.0;
    let height = options.row_height() * row_count as f64;
    let mut x = 0.0;
    timeline
        .ticks
        .iter()
        .map(|date| {
            let thick = match timeline.mode {
                ViewMode::Day => date.day() == 1,
                ViewMode::Week => date.day() < 8,
                ViewMode::Month => date.month0() % 3 == 0,
                _ => false,
            };
            let tick = Tick {
                x,
                y,
                height,
                thick,
            };
            x += timeline.column_width_at(*date);
            tick
        })
        .collect()
}

/// Today, holidays and weekends; only drawn in day view.
fn highlights(
    timeline: &Timeline,
    options: &GanttOptions,
    row_count: usize,
    today: NaiveDateTime,
) -> Vec<DayHighlight> {
    if timeline.mode != ViewMode::Day {
        return Vec::new();
    }
    let today = calendar::start_of(today, TimeUnit::Day);
    let y = options.header_height / 2.0 + options.padding / 2.0;
    let height = options.row_height() * row_count as f64 + options.header_height / 2.0;

    let mut out = Vec::new();
    for date in &timeline.ticks {
        let is_today = *date == today;
        let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let special = options.special_day(date.date());

        let kind = if is_today {
            Some(HighlightKind::Today)
        } else {
            match special {
                Some(day) if day.is_holiday => Some(HighlightKind::Holiday),
                Some(_) if is_weekend => Some(HighlightKind::Workday),
                None if is_weekend => Some(HighlightKind::Holiday),
                _ => None,
            }
        };
        if let Some(kind) = kind {
            out.push(DayHighlight {
                rect: Rect::new(timeline.date_to_x(*date), y, timeline.column_width, height),
                kind,
            });
        }
    }
    out
}

fn date_labels(timeline: &Timeline, options: &GanttOptions) -> Vec<DateLabel> {
    let mut labels: Vec<DateLabel> = Vec::with_capacity(timeline.ticks.len());
    for date in &timeline.ticks {
        let label = date_label(*date, labels.last(), timeline, options);
        labels.push(label);
    }
    labels
}

fn date_label(
    date: NaiveDateTime,
    last: Option<&DateLabel>,
    timeline: &Timeline,
    options: &GanttOptions,
) -> DateLabel {
    // Far enough back that day, month and year all differ.
    let last_date = last
        .map(|l| l.date)
        .unwrap_or_else(|| calendar::add(date, -400.0, TimeUnit::Day));
    let lang = options.language.as_str();
    let fmt = |pattern: &str| calendar::format(date, pattern, lang);

    let new_day = date.day() != last_date.day();
    let new_month = date.month() != last_date.month();
    let new_year = date.year() != last_date.year();

    let step = timeline.step;
    let base_width = timeline.column_width;
    let month_adj = calendar::diff(date, calendar::start_of(date, TimeUnit::Month), TimeUnit::Hour)
        * base_width
        / step;
    let year_adj = calendar::diff(date, calendar::start_of(date, TimeUnit::Year), TimeUnit::Hour)
        * base_width
        / step;

    let column_width = timeline.column_width_at(date);
    let when = |cond: bool, pattern: &str| if cond { fmt(pattern) } else { String::new() };

    let (lower_text, upper_text, lower_dx, upper_dx) = match timeline.mode {
        ViewMode::QuarterDay => (
            fmt("%H"),
            when(new_day, "%-d %b"),
            0.0,
            column_width * 4.0 / 2.0,
        ),
        ViewMode::HalfDay => (
            fmt("%H"),
            if new_day {
                if new_month {
                    fmt("%-d %b")
                } else {
                    fmt("%-d")
                }
            } else {
                String::new()
            },
            0.0,
            column_width * 2.0 / 2.0,
        ),
        ViewMode::Day => (
            when(new_day, "%-d %a"),
            when(new_month, "%Y %B"),
            column_width / 2.0,
            column_width * 30.0 / 2.0 - month_adj,
        ),
        ViewMode::Week => (
            if new_month { fmt("%-d %b") } else { fmt("%-d") },
            when(new_month, "%B"),
            0.0,
            column_width * 4.0 / 2.0 - month_adj,
        ),
        ViewMode::Month => (
            fmt("%B"),
            when(new_year, "%Y"),
            column_width / 2.0,
            column_width * 12.0 / 2.0 - year_adj,
        ),
        ViewMode::Year => (fmt("%Y"), String::new(), column_width / 2.0, column_width / 2.0),
    };

    let special_day = options.special_day(date.date()).is_some();
    let lower_text = if special_day {
        format!("{lower_text}*")
    } else {
        lower_text
    };

    let base_x = last.map(|l| l.base_x + l.column_width).unwrap_or(0.0);
    DateLabel {
        date,
        column_width,
        base_x,
        lower_text,
        lower_x: base_x + lower_dx,
        lower_y: options.header_height,
        upper_text,
        upper_x: base_x + upper_dx,
        upper_y: options.header_height - 25.0,
        special_day,
    }
}

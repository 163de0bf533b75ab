use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{self, TimeUnit};

/// Spans longer than this are treated as data errors.
const MAX_SPAN_YEARS: f64 = 10.0;
/// Days synthesized around a task that is missing one or both dates.
const DEFAULT_SPAN_DAYS: f64 = 2.0;

/// Dependencies as supplied by the caller: either `"a, b"` or `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyList {
    Joined(String),
    List(Vec<String>),
}

impl DependencyList {
    /// Trimmed, non-empty ids in first-seen order without duplicates.
    pub fn into_ids(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            DependencyList::Joined(s) => s.split(',').map(str::to_string).collect(),
            DependencyList::List(v) => v,
        };
        let mut ids: Vec<String> = Vec::with_capacity(raw.len());
        for id in raw {
            let id = id.trim();
            if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// A task record as handed in by the caller, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub dependencies: Option<DependencyList>,
    #[serde(default)]
    pub custom_class: Option<String>,
    #[serde(default)]
    pub show_label: Option<bool>,
}

impl TaskInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(DependencyList::List(
            ids.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// A normalized task: both dates present, progress clamped, dependencies
/// deduplicated and the row index assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start: NaiveDateTime,
    /// Exclusive end. A bare date end is pushed to the following midnight.
    pub end: NaiveDateTime,
    /// Percent complete, 0..=100.
    pub progress: u8,
    pub dependencies: Vec<String>,
    /// Dense row slot, reassigned on every structural change.
    pub index: usize,
    /// Set when a date had to be synthesized; such bars are not interactive.
    pub invalid: bool,
    pub custom_class: Option<String>,
    pub show_label: bool,
}

impl Task {
    /// Normalize a caller record into row `index`, using `today` to
    /// synthesize a window when both dates are missing.
    pub fn from_input(input: TaskInput, index: usize, today: NaiveDateTime) -> Self {
        let parsed_start = input.start.as_deref().and_then(calendar::parse);
        let mut parsed_end = input.end.as_deref().and_then(calendar::parse);

        if let (Some(start), Some(end)) = (parsed_start, parsed_end) {
            if calendar::diff(end, start, TimeUnit::Year) > MAX_SPAN_YEARS {
                parsed_end = None;
            }
        }

        let invalid = parsed_start.is_none() || parsed_end.is_none();
        let (start, mut end) = match (parsed_start, parsed_end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, calendar::add(start, DEFAULT_SPAN_DAYS, TimeUnit::Day)),
            (None, Some(end)) => (calendar::add(end, -DEFAULT_SPAN_DAYS, TimeUnit::Day), end),
            (None, None) => (today, calendar::add(today, DEFAULT_SPAN_DAYS, TimeUnit::Day)),
        };

        // A midnight end means "through the whole of that day".
        if calendar::is_midnight(end) {
            end = calendar::add(end, 24.0, TimeUnit::Hour);
        }

        let id = match input.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_id(&input.name),
        };

        Self {
            id,
            name: input.name,
            start,
            end,
            progress: normalize_progress(input.progress),
            dependencies: input.dependencies.map(DependencyList::into_ids).unwrap_or_default(),
            index,
            invalid,
            custom_class: input.custom_class,
            show_label: input.show_label.unwrap_or(true),
        }
    }

    pub fn duration_hours(&self) -> f64 {
        calendar::diff(self.end, self.start, TimeUnit::Hour)
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }
}

fn normalize_progress(progress: Option<f64>) -> u8 {
    progress
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

/// Id for tasks supplied without one: the name plus a random suffix.
pub fn generate_id(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", name, &suffix[..10])
}

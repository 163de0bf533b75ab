use thiserror::Error;

/// Errors raised for programmer or configuration mistakes.
///
/// Bad task data never ends up here: unparseable dates or oversized spans mark
/// the task invalid instead, and pointer noise is clamped.
#[derive(Error, Debug)]
pub enum GanttError {
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("unknown view mode: {0}")]
    UnknownViewMode(String),

    #[error("task not found: {0}")]
    UnknownTask(String),

    #[error("arrow from `{0}` has no target task")]
    ArrowWithoutTarget(String),

    #[error("invalid arrow end point ({x}, {y})")]
    InvalidEndpoint { x: f64, y: f64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GanttError>;

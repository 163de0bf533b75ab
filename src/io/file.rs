use std::path::Path;

use gantt_timeline::{GanttOptions, Result, TaskInput};
use serde::Deserialize;

/// A chart on disk: `{ "options": {...}, "tasks": [...] }`. Both keys are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChartFile {
    pub options: GanttOptions,
    pub tasks: Vec<TaskInput>,
}

impl ChartFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ChartFile = serde_json::from_str(json)?;
        file.options.validate()?;
        Ok(file)
    }
}

/// Load a chart from a JSON file.
pub fn load_chart(path: &Path) -> Result<ChartFile> {
    let json = std::fs::read_to_string(path)?;
    let file = ChartFile::from_json_str(&json)?;
    tracing::info!(path = %path.display(), tasks = file.tasks.len(), "chart loaded");
    Ok(file)
}

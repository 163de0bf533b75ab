use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{Task, ViewMode};

/// Notifications produced by commits and view changes, in firing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GanttEvent {
    DateChange {
        task_id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    ProgressChange {
        task_id: String,
        progress: u8,
    },
    ViewChange(ViewMode),
}

/// Caller-supplied callbacks, invoked synchronously as events fire.
/// Every method defaults to doing nothing.
pub trait GanttHandler {
    fn date_change(&mut self, _task: &Task, _start: NaiveDateTime, _end: NaiveDateTime) {}

    fn progress_change(&mut self, _task: &Task, _progress: u8) {}

    fn view_change(&mut self, _mode: ViewMode) {}
}

impl GanttHandler for () {}

/// Collects every event; handy for tests and for front ends that poll.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<GanttEvent>,
}

impl GanttHandler for EventLog {
    fn date_change(&mut self, task: &Task, start: NaiveDateTime, end: NaiveDateTime) {
        self.events.push(GanttEvent::DateChange {
            task_id: task.id.clone(),
            start,
            end,
        });
    }

    fn progress_change(&mut self, task: &Task, progress: u8) {
        self.events.push(GanttEvent::ProgressChange {
            task_id: task.id.clone(),
            progress,
        });
    }

    fn view_change(&mut self, mode: ViewMode) {
        self.events.push(GanttEvent::ViewChange(mode));
    }
}

pub mod dependency;
pub mod options;
pub mod task;
pub mod timeline;

pub use dependency::DependencyIndex;
pub use options::{GanttOptions, PopupTrigger, SpecialDay};
pub use task::{DependencyList, Task, TaskInput};
pub use timeline::{Timeline, ViewMode, ViewScale};

//! Interactive Gantt timeline engine.
//!
//! Tasks are normalized into a [`model::Timeline`] that maps dates to pixels;
//! [`layout`] turns them into bar rectangles, routed dependency arrows and the
//! date header; [`interaction`] runs the drag/resize/progress/connect gestures
//! and commits them back into task dates. [`Gantt`] ties it together.

pub mod calendar;
pub mod chart;
pub mod error;
pub mod events;
pub mod gantt;
pub mod interaction;
pub mod layout;
pub mod model;

pub use chart::{Hit, Popup, Selection};
pub use error::{GanttError, Result};
pub use events::{EventLog, GanttEvent, GanttHandler};
pub use gantt::Gantt;
pub use interaction::InteractionState;
pub use layout::{Point, Rect};
pub use model::{GanttOptions, Task, TaskInput, ViewMode};

mod file;

pub use file::{load_chart, ChartFile};

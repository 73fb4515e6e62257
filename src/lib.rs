//! Time-blocked task lists with free-text quick entry.

pub mod calendar;
pub mod config;
pub mod export;
pub mod filter;
pub mod model;
pub mod parser;
pub mod selection;
pub mod session;
pub mod storage;

pub use filter::{filter_tasks, FilteredView, Stats};
pub use model::{Project, Subtask, Task, TaskId, TimeBlock, Workspace};
pub use parser::parse_quick_entry;
pub use selection::ViewSelection;
pub use session::Session;

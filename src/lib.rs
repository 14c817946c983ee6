pub mod assignments;
pub mod calendar;
pub mod config;
pub mod database;
pub mod dates;
pub mod logging;
pub mod model;
pub mod store;

pub use calendar::{current_month, month_at, upcoming, CalendarAggregator, ColorPalette, MonthCursor};
pub use database::{SqliteStorage, StorageError};
pub use model::{AssignmentEvent, CalendarDayBucket, CalendarEvent, EventKind, MonthInfo, TodoItem};
pub use store::{MemoryStorage, MutationOutcome, TodoStorage, TodoStore};

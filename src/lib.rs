// CourseStore - course catalog, favorites, comments and timetable over flat JSON documents

pub mod app;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod document;
pub mod encourage;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod models;
pub mod record;
pub mod sqlite;
pub mod store;
pub mod timetable;

// Re-export main types for convenience
pub use app::{AnyStore, Scheduler, init_data};
pub use catalog::{Catalog, ClassQuery};
pub use config::{Backend, Config};
pub use error::{CourseError, CourseResult, Entity, ErrorKind};
pub use filter::{Filter, FilterOp};
pub use models::{ClassRecord, ClassSummary, Comment, Favorite, FavoriteView, TimetableEntry, TimetableView};
pub use record::{IndexValue, Record};
pub use store::{JsonStore, RecordStore};

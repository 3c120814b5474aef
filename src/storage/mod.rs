//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - logs(id, message, level, timestamp, service, component)
//!
//! with secondary indexes on `timestamp` and `level`.

pub mod query;
pub mod schema;
pub mod sqlite;

pub use query::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, Filter, Predicates};
pub use sqlite::{LevelStats, LogPage, LogStore, StatisticsReport};

//! # Logbook - minimal log ingestion and query service
//!
//! Logbook provides:
//! - A structured log entry model with lenient JSON ingestion
//! - SQLite-backed storage with filtered, paginated reads
//! - Per-level aggregate statistics
//! - A thin HTTP surface over the request layer

pub mod entry;
pub mod id;
pub mod storage;
pub mod service;
pub mod server;
pub mod config;

// Re-exports for convenient access
pub use entry::{LogEntry, LogLevel, LogPayload};
pub use id::{IdGenerator, UuidGenerator};
pub use service::LogService;
pub use storage::{Filter, LogStore, StatisticsReport};

/// Result type alias for Logbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Logbook operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Log entry with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Failed to initialize storage: {0}")]
    StorageInit(#[source] rusqlite::Error),

    #[error("Failed to write log entry: {0}")]
    StorageWrite(#[source] rusqlite::Error),

    #[error("Failed to read log entries: {0}")]
    StorageRead(#[source] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure was caused by the caller's input rather than the server
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::DuplicateId(_))
    }
}

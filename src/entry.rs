//! Log entry model
//!
//! Every persisted record is a [`LogEntry`]. Inbound JSON is first parsed into a
//! lenient [`LogPayload`] whose missing fields are filled in at ingestion time:
//! - `level` falls back to `INFO` (also for unrecognized names)
//! - `message` falls back to an empty string
//! - `timestamp` falls back to the ingestion time
//! - `id` is generated when absent or empty

use crate::id::IdGenerator;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of a log entry, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Get the wire/storage representation of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Get all levels in severity order
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ]
    }

    /// Parse a level name, falling back to `INFO` for anything unrecognized
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LogLevel::all()
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown log level: {}", s)))
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        LogLevel::parse_lossy(&s)
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.as_str()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A persisted log record.
///
/// Entries are immutable once stored. Unset `service`/`component` labels are
/// `None` in memory, NULL in storage and `""` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier (primary key)
    pub id: String,
    pub message: String,
    pub level: LogLevel,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, with = "label")]
    pub service: Option<String>,
    #[serde(default, with = "label")]
    pub component: Option<String>,
}

impl LogEntry {
    /// Create an entry with no service/component labels
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        level: LogLevel,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            level,
            timestamp,
            service: None,
            component: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = normalize_label(Some(service.into()));
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = normalize_label(Some(component.into()));
        self
    }
}

/// Inbound entry as submitted by a client; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogPayload {
    pub id: Option<String>,
    pub message: Option<String>,
    pub level: Option<LogLevel>,
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "label::deserialize")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "label::deserialize")]
    pub component: Option<String>,
}

impl LogPayload {
    /// Parse a JSON request body; only a JSON object is accepted
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("Malformed log payload: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Validation(
                "Malformed log payload: expected a JSON object".to_string(),
            ));
        }

        LogPayload::deserialize(value)
            .map_err(|e| Error::Validation(format!("Malformed log payload: {}", e)))
    }

    /// Fill in defaults and produce the entry to persist.
    ///
    /// `now` is the ingestion time in epoch seconds.
    pub fn into_entry(self, ids: &dyn IdGenerator, now: i64) -> LogEntry {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => ids.generate(),
        };

        LogEntry {
            id,
            message: self.message.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or(now),
            service: self.service,
            component: self.component,
        }
    }
}

/// Treat empty labels as unset
pub fn normalize_label(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Serde adapter for optional labels: `None` <-> `""`
mod label {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        Ok(super::normalize_label(value))
    }
}

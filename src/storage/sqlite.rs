//! SQLite storage implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, ErrorCode, ffi, params};
use serde::Serialize;

use super::query::Filter;
use super::schema;
use crate::entry::{LogEntry, LogLevel, normalize_label};
use crate::{Error, Result};

/// SQLite-backed storage for log entries.
///
/// The single connection sits behind a mutex: inserts are serialized, a read
/// never sees a half-written row, and a duplicate id always loses regardless
/// of interleaving. Each operation holds the lock for one statement.
pub struct LogStore {
    conn: Mutex<Connection>,
}

impl LogStore {
    /// Open a database file (creates it and its parent directory if needed)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StorageInit(rusqlite::Error::SqliteFailure(
                        ffi::Error::new(ffi::SQLITE_CANTOPEN),
                        Some(format!("cannot create {}: {}", parent.display(), e)),
                    ))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(Error::StorageInit)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize()?;
        tracing::debug!("Opened log store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::StorageInit)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize()?;
        Ok(store)
    }

    /// Ensure the table and its indexes exist. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).map_err(Error::StorageInit)?;
        }
        tracing::debug!("Log schema ready");
        Ok(())
    }

    /// Lock the connection. A panic while holding the lock cannot leave a
    /// statement half-applied, so a poisoned lock is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new entry; fails with [`Error::DuplicateId`] if the id exists
    pub fn insert(&self, entry: &LogEntry) -> Result<()> {
        self.conn()
            .execute(
                r#"
                INSERT INTO logs (id, message, level, timestamp, service, component)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    entry.id,
                    entry.message,
                    entry.level.as_str(),
                    entry.timestamp,
                    entry.service,
                    entry.component,
                ],
            )
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Error::DuplicateId(entry.id.clone())
                } else {
                    Error::StorageWrite(e)
                }
            })?;

        tracing::debug!(id = %entry.id, level = %entry.level, "Stored log entry");
        Ok(())
    }

    /// Entries matching `filter`, newest first, limited to the filter's page.
    ///
    /// Entries sharing a timestamp are ordered by id so page boundaries are stable.
    pub fn query(&self, filter: &Filter) -> Result<LogPage> {
        let predicates = filter.predicates();
        let next = predicates.next_index();
        let sql = format!(
            "SELECT {} FROM logs {} ORDER BY timestamp DESC, id ASC LIMIT ?{} OFFSET ?{}",
            schema::ENTRY_COLUMNS,
            predicates.where_clause(),
            next,
            next + 1,
        );

        let mut params = predicates.into_params();
        params.push(i64::from(filter.page_size).into());
        params.push(filter.offset().into());

        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&sql).map_err(Error::StorageRead)?;
        let entries = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_entry)
            .map_err(Error::StorageRead)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::StorageRead)?;

        Ok(LogPage {
            entries: entries.into_iter(),
        })
    }

    /// Per-level count and timestamp range over the whole table
    pub fn statistics(&self) -> Result<StatisticsReport> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare_cached(
                r#"
                SELECT level, COUNT(*), MIN(timestamp), MAX(timestamp)
                FROM logs
                GROUP BY level
                "#,
            )
            .map_err(Error::StorageRead)?;

        let rows = stmt
            .query_map([], |row| {
                let level: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((
                    LogLevel::parse_lossy(&level),
                    LevelStats {
                        count: count as u64,
                        oldest: row.get(2)?,
                        newest: row.get(3)?,
                    },
                ))
            })
            .map_err(Error::StorageRead)?;

        let mut report = StatisticsReport::default();
        for row in rows {
            let (level, stats) = row.map_err(Error::StorageRead)?;
            report.record(level, stats);
        }
        Ok(report)
    }

    /// Count all entries
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
            .map_err(Error::StorageRead)?;
        Ok(count as usize)
    }

    /// Close the underlying connection, flushing anything pending
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| Error::StorageWrite(e))
    }
}

/// Only the `id` primary key can raise a uniqueness violation on `logs`
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

/// Helper to convert a row to a LogEntry
fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<LogEntry> {
    let level: String = row.get(2)?;

    Ok(LogEntry {
        id: row.get(0)?,
        message: row.get(1)?,
        level: LogLevel::parse_lossy(&level),
        timestamp: row.get(3)?,
        service: normalize_label(row.get(4)?),
        component: normalize_label(row.get(5)?),
    })
}

/// One page of query results.
///
/// Finite and single-pass; rows are read out before the connection lock is
/// released, so holding a page never blocks writers.
#[derive(Debug)]
pub struct LogPage {
    entries: std::vec::IntoIter<LogEntry>,
}

impl Iterator for LogPage {
    type Item = LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for LogPage {}

/// Aggregate for a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub count: u64,
    /// Smallest timestamp seen at this level
    pub oldest: i64,
    /// Largest timestamp seen at this level
    pub newest: i64,
}

/// Statistics keyed by level; levels without entries are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatisticsReport {
    levels: BTreeMap<LogLevel, LevelStats>,
}

impl StatisticsReport {
    fn record(&mut self, level: LogLevel, stats: LevelStats) {
        self.levels
            .entry(level)
            .and_modify(|existing| {
                existing.count += stats.count;
                existing.oldest = existing.oldest.min(stats.oldest);
                existing.newest = existing.newest.max(stats.newest);
            })
            .or_insert(stats);
    }

    pub fn get(&self, level: LogLevel) -> Option<&LevelStats> {
        self.levels.get(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Total entries across all levels
    pub fn total(&self) -> u64 {
        self.levels.values().map(|s| s.count).sum()
    }

    /// Levels in severity order
    pub fn iter(&self) -> impl Iterator<Item = (&LogLevel, &LevelStats)> {
        self.levels.iter()
    }
}

impl std::fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Log Statistics:")?;
        for (level, stats) in self.iter() {
            writeln!(
                f,
                "  {:<8} count={} oldest={} newest={}",
                level.as_str(),
                stats.count,
                stats.oldest,
                stats.newest
            )?;
        }
        write!(f, "  Total: {}", self.total())
    }
}

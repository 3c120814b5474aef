//! Database schema definitions

/// SQL to create the logs table
pub const CREATE_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id TEXT PRIMARY KEY,
    message TEXT NOT NULL,
    level TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    service TEXT,
    component TEXT
)
"#;

/// SQL to create indexes backing time-ordered and level-filtered reads
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level)",
];

/// Columns selected for a full entry, in `row_to_entry` order
pub const ENTRY_COLUMNS: &str = "id, message, level, timestamp, service, component";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_LOGS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

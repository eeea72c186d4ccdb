//! Database schema SQL for result record tables.

use once_cell::sync::Lazy;
use regex::Regex;

/// Table names end up in SQL identifiers; only plain names are accepted.
static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]{0,127}$").unwrap());

/// Whether `table` is usable as a record table name.
pub fn is_valid_table_name(table: &str) -> bool {
    TABLE_NAME_RE.is_match(table) && !table.to_ascii_lowercase().starts_with("sqlite_")
}

/// DDL for one result record table. The name must already be validated.
pub fn record_table_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    file_hash TEXT PRIMARY KEY NOT NULL,
    text_content TEXT,
    processing_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (processing_status IN ('pending', 'completed', 'failed')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);
"#
    )
}

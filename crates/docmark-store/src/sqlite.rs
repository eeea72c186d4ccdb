//! SQLite-backed result record store.
//!
//! Each logical table named in a trigger message maps to one SQLite table in
//! `db_dir/docmark.db`, keyed by `file_hash`.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::{is_valid_table_name, record_table_sql};
use crate::types::{ProcessingStatus, ResultRecord};
use crate::RecordStore;
use docmark_core::{Error, Result};

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteRecordStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/records/`). The file will be `db_dir/docmark.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Persistence(e.to_string()))?;
        let db_path = db_dir.join("docmark.db");

        let conn = Self::create_connection(&db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let tables = store.tables()?;
        info!(
            "SqliteRecordStore initialized: {} tables, path={}",
            tables.len(),
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create a record table if it does not exist yet.
    pub fn create_table(&self, table: &str) -> Result<()> {
        check_table_name(table)?;
        let conn = self.conn.lock();
        conn.execute_batch(&record_table_sql(table))
            .map_err(|e| Error::Persistence(format!("Creating table '{}' failed: {}", table, e)))?;
        Ok(())
    }

    /// Names of all record tables.
    pub fn tables(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT name FROM sqlite_master WHERE type = 'table' \
                 AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .map_err(db_err)?
            .query_row(params![table], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResultRecord> {
        let status: String = row.get("processing_status")?;
        Ok(ResultRecord {
            file_hash: row.get("file_hash")?,
            text_content: row.get("text_content")?,
            processing_status: ProcessingStatus::parse(&status)
                .unwrap_or(ProcessingStatus::Pending),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn complete(&self, table: &str, file_hash: &str, text_content: &str) -> Result<()> {
        check_table_name(table)?;
        let conn = self.conn.lock();
        if !Self::table_exists(&conn, table)? {
            return Err(Error::Persistence(format!("Unknown table '{}'", table)));
        }

        // One statement, so both columns change together.
        let sql = format!(
            "UPDATE \"{}\" SET text_content = ?1, processing_status = ?2, updated_at = ?3 \
             WHERE file_hash = ?4",
            table
        );
        let count = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .execute(params![
                text_content,
                ProcessingStatus::Completed.as_str(),
                now_millis(),
                file_hash,
            ])
            .map_err(db_err)?;

        if count == 0 {
            return Err(Error::Persistence(format!(
                "No record for fileHash '{}' in table '{}'",
                file_hash, table
            )));
        }
        debug!("Completed record {}/{} ({} chars)", table, file_hash, text_content.len());
        Ok(())
    }

    fn create_pending(&self, table: &str, file_hash: &str) -> Result<bool> {
        if file_hash.is_empty() {
            return Err(Error::Persistence("Empty fileHash".into()));
        }
        self.create_table(table)?;
        let conn = self.conn.lock();
        let sql = format!(
            "INSERT OR IGNORE INTO \"{}\" (file_hash, processing_status, created_at) \
             VALUES (?1, ?2, ?3)",
            table
        );
        let count = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .execute(params![file_hash, ProcessingStatus::Pending.as_str(), now_millis()])
            .map_err(db_err)?;
        Ok(count > 0)
    }

    fn get(&self, table: &str, file_hash: &str) -> Result<Option<ResultRecord>> {
        check_table_name(table)?;
        let conn = self.conn.lock();
        if !Self::table_exists(&conn, table)? {
            return Ok(None);
        }
        let sql = format!("SELECT * FROM \"{}\" WHERE file_hash = ?1", table);
        let record = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .query_row(params![file_hash], Self::row_to_record)
            .optional()
            .map_err(db_err)?;
        Ok(record)
    }
}

fn check_table_name(table: &str) -> Result<()> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(Error::Persistence(format!("Invalid table name '{}'", table)))
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Persistence(e.to_string())
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

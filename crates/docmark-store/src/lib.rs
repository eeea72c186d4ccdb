//! docmark Store — Result Records keyed by content key, one SQLite table per logical table.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteRecordStore;
pub use types::*;

use docmark_core::Result;

/// Keyed record store holding conversion results.
///
/// Implementations must apply [`RecordStore::complete`] as a single atomic
/// update: `text_content` and `processing_status` change together or not at all.
pub trait RecordStore: Send + Sync {
    /// Set `text_content` and mark the row `completed`.
    ///
    /// Fails with `Error::Persistence` if the table or row does not exist.
    fn complete(&self, table: &str, file_hash: &str, text_content: &str) -> Result<()>;

    /// Create a `pending` row (the upstream writer's step). Returns `false`
    /// if the row already existed.
    fn create_pending(&self, table: &str, file_hash: &str) -> Result<bool>;

    /// Look up a record.
    fn get(&self, table: &str, file_hash: &str) -> Result<Option<ResultRecord>>;
}

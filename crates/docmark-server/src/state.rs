//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use docmark_core::WorkerConfig;
use docmark_ingest::{
    channel_for_topic, FsObjectStore, IngestWorker, MarkdownConverter, TypePolicy,
};
use docmark_store::{RecordStore, SqliteRecordStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: WorkerConfig,
    pub worker: IngestWorker,
    pub records: Arc<SqliteRecordStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Construct every client from configuration and wire them into the worker.
    pub fn new(config: WorkerConfig) -> docmark_core::Result<Self> {
        let paths = &config.data_paths;
        let objects = Arc::new(FsObjectStore::new(&paths.objects));
        let records = Arc::new(SqliteRecordStore::open(&paths.records)?);

        // Without a topic the channel is never used: batches fail before publishing.
        let notifier = channel_for_topic(
            config.notification_topic.as_deref().unwrap_or_default(),
            &paths.topics,
        );
        let policy = TypePolicy::new(config.allow_html, config.strict_mime);

        let worker = IngestWorker::new(
            objects,
            records.clone() as Arc<dyn RecordStore>,
            notifier,
            Arc::new(MarkdownConverter::new()),
        )
        .with_policy(policy)
        .with_topic(config.notification_topic.clone());

        Ok(Self {
            config,
            worker,
            records,
            started_at: Utc::now(),
        })
    }
}

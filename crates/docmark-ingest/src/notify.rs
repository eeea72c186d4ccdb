//! Completion events and the channels they are published to.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docmark_core::{Error, Result};
use docmark_store::ProcessingStatus;

/// Published after a record has been completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub file_hash: String,
    pub status: ProcessingStatus,
    pub bucket: String,
    pub key: String,
}

/// Trait for notification backends. Publishing is fire-and-forget.
pub trait NotificationChannel: Send + Sync {
    fn publish(&self, topic: &str, event: &CompletionEvent) -> Result<()>;
}

/// Pick a channel for a topic address: `http(s)://` URLs are webhooks,
/// anything else names a file-backed topic under `topics_dir`.
pub fn channel_for_topic(topic: &str, topics_dir: &Path) -> Arc<dyn NotificationChannel> {
    if topic.starts_with("http://") || topic.starts_with("https://") {
        Arc::new(HttpTopicChannel::new())
    } else {
        Arc::new(FileTopicChannel::new(topics_dir))
    }
}

/// Appends one JSON line per event to `<dir>/<topic>.jsonl`.
pub struct FileTopicChannel {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTopicChannel {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// File backing a topic.
    pub fn topic_path(&self, topic: &str) -> PathBuf {
        let topic = topic.strip_prefix("file://").unwrap_or(topic);
        let name: String = topic
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        let name = name.trim_start_matches('.');
        let name = if name.is_empty() { "default" } else { name };
        self.dir.join(format!("{}.jsonl", name))
    }

    /// All events published to a topic so far.
    pub fn read_events(&self, topic: &str) -> Result<Vec<CompletionEvent>> {
        let data = match std::fs::read_to_string(self.topic_path(topic)) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Error::from))
            .collect()
    }
}

impl NotificationChannel for FileTopicChannel {
    fn publish(&self, topic: &str, event: &CompletionEvent) -> Result<()> {
        let path = self.topic_path(topic);
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let _guard = self.write_lock.lock();
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Notification(format!("{}: {}", self.dir.display(), e)))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::Notification(format!("{}: {}", path.display(), e)))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::Notification(format!("{}: {}", path.display(), e)))?;

        debug!("Published {} to {}", event.file_hash, path.display());
        Ok(())
    }
}

/// POSTs each event as JSON to the topic URL.
pub struct HttpTopicChannel {
    timeout: Duration,
}

impl HttpTopicChannel {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for HttpTopicChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for HttpTopicChannel {
    fn publish(&self, topic: &str, event: &CompletionEvent) -> Result<()> {
        // Built per call: the blocking client must live on the worker thread,
        // never on the async runtime.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Notification(e.to_string()))?;

        let response = client
            .post(topic)
            .json(event)
            .send()
            .map_err(|e| Error::Notification(format!("POST {} failed: {}", topic, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notification(format!("POST {} returned {}", topic, status)));
        }
        debug!("Published {} to {}", event.file_hash, topic);
        Ok(())
    }
}

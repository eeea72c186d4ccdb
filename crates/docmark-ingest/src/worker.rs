//! The ingestion state machine: validate → fetch → convert → persist → notify.
//!
//! Each message moves `Received → Validated → Fetched → Converted →
//! Persisted → Notified → Done`, or stops in `Failed` at the first error.
//! Nothing is retried here; redelivery belongs to the queue.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::convert::DocumentConverter;
use crate::key::{content_hash, content_key};
use crate::notify::{CompletionEvent, NotificationChannel};
use crate::object::ObjectStore;
use crate::policy::{DocumentFormat, TypePolicy};
use crate::trigger::{DirectPayload, QueueRecord, TriggerMessage};
use docmark_core::{Error, Result};
use docmark_store::{ProcessingStatus, RecordStore};

/// Where a message is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Received,
    Validated,
    Fetched,
    Converted,
    Persisted,
    Notified,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Fetched => "fetched",
            Self::Converted => "converted",
            Self::Persisted => "persisted",
            Self::Notified => "notified",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A message that went all the way to `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub file_hash: String,
    pub bucket: String,
    pub key: String,
    pub table: String,
    pub format: String,
    pub markdown_chars: usize,
}

/// A message that ended in `Failed`.
#[derive(Debug)]
pub struct MessageFailure {
    /// Last stage reached before the failing step.
    pub reached: Stage,
    pub error: Error,
    pub file_hash: Option<String>,
}

/// Outcome of one direct (embedded payload) conversion.
#[derive(Debug, Clone)]
pub struct DirectConversion {
    pub markdown: String,
    pub format: DocumentFormat,
    pub content_hash: String,
    pub size_bytes: usize,
}

/// Per-record failure entry of a batch report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    /// The record's `messageId`, or its position in the batch when absent.
    pub item_identifier: String,
    pub stage: Stage,
    pub code: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

/// Summary of one queued invocation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub completions: Vec<Completion>,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(
        &mut self,
        index: usize,
        message_id: Option<&str>,
        outcome: std::result::Result<Completion, MessageFailure>,
    ) {
        self.processed += 1;
        match outcome {
            Ok(completion) => {
                self.succeeded += 1;
                self.completions.push(completion);
            }
            Err(failure) => self.failures.push(RecordFailure {
                item_identifier: message_id
                    .map(str::to_string)
                    .unwrap_or_else(|| index.to_string()),
                stage: failure.reached,
                code: failure.error.code(),
                error: failure.error.to_string(),
                file_hash: failure.file_hash,
            }),
        }
    }
}

/// Tracks one message through the state machine.
struct MessageRun<'a> {
    message: &'a TriggerMessage,
    stage: Stage,
    file_hash: Option<String>,
}

impl<'a> MessageRun<'a> {
    fn new(message: &'a TriggerMessage) -> Self {
        Self {
            message,
            stage: Stage::Received,
            file_hash: None,
        }
    }

    /// Move to `next` if `result` is Ok, otherwise fail the message.
    fn advance<T>(&mut self, next: Stage, result: Result<T>) -> std::result::Result<T, MessageFailure> {
        match result {
            Ok(value) => {
                debug!("{} → {}", self.stage, next);
                self.stage = next;
                Ok(value)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, error: Error) -> MessageFailure {
        let file_hash = self.file_hash.as_deref().unwrap_or("-");
        match &error {
            Error::UnsupportedType(_) | Error::ExportRequired(_) | Error::BadRequest(_) => warn!(
                "Rejected s3://{}/{} (table={}, fileHash={}) after {}: {}",
                self.message.bucket, self.message.key, self.message.table, file_hash, self.stage, error
            ),
            _ => error!(
                "Failed s3://{}/{} (table={}, fileHash={}) after {}: {}",
                self.message.bucket, self.message.key, self.message.table, file_hash, self.stage, error
            ),
        }
        MessageFailure {
            reached: self.stage,
            error,
            file_hash: self.file_hash.clone(),
        }
    }
}

/// Converts stored documents and records the result.
///
/// Collaborators are injected so the process bootstrap owns their lifecycle
/// and tests can substitute fakes.
pub struct IngestWorker {
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    notifier: Arc<dyn NotificationChannel>,
    converter: Arc<dyn DocumentConverter>,
    policy: TypePolicy,
    topic: Option<String>,
}

impl IngestWorker {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationChannel>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        Self {
            objects,
            records,
            notifier,
            converter,
            policy: TypePolicy::default(),
            topic: None,
        }
    }

    pub fn with_policy(mut self, policy: TypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn policy(&self) -> &TypePolicy {
        &self.policy
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The notification topic, or a configuration error if none is set.
    pub fn require_topic(&self) -> Result<&str> {
        self.topic
            .as_deref()
            .ok_or_else(|| Error::Configuration("notification topic is not configured".into()))
    }

    /// Process a queued batch, one record at a time, in order.
    ///
    /// A failing record does not stop the batch. The only error returned is a
    /// configuration error, raised before any record is touched.
    pub fn process_batch(&self, records: &[QueueRecord]) -> Result<BatchReport> {
        let topic = self.require_topic()?;
        info!("Processing batch of {} records", records.len());

        let mut report = BatchReport::default();
        for (index, record) in records.iter().enumerate() {
            let outcome = match record.message() {
                Ok(message) => self.process_message(topic, &message),
                Err(e) => {
                    warn!("Record {} has an unusable body: {}", index, e);
                    Err(MessageFailure {
                        reached: Stage::Received,
                        error: e,
                        file_hash: None,
                    })
                }
            };
            report.record(index, record.message_id.as_deref(), outcome);
        }

        info!(
            "Batch finished: {} processed, {} succeeded, {} failed",
            report.processed,
            report.succeeded,
            report.failures.len()
        );
        Ok(report)
    }

    /// Run one trigger message through the state machine.
    pub fn process_message(
        &self,
        topic: &str,
        message: &TriggerMessage,
    ) -> std::result::Result<Completion, MessageFailure> {
        let span = info_span!("message", bucket = %message.bucket, key = %message.key, table = %message.table);
        let _entered = span.enter();
        let mut run = MessageRun::new(message);

        let file_hash = match content_key(&message.key) {
            Ok(k) => k.to_string(),
            Err(e) => return Err(run.fail(e)),
        };
        run.file_hash = Some(file_hash.clone());
        let format = run.advance(Stage::Validated, self.policy.validate(&message.key))?;

        let bytes = run.advance(Stage::Fetched, self.fetch(format, message))?;
        let markdown = run.advance(Stage::Converted, self.convert(format, &bytes))?;

        run.advance(
            Stage::Persisted,
            self.records.complete(&message.table, &file_hash, &markdown),
        )?;

        let event = CompletionEvent {
            file_hash: file_hash.clone(),
            status: ProcessingStatus::Completed,
            bucket: message.bucket.clone(),
            key: message.key.clone(),
        };
        run.advance(Stage::Notified, self.notifier.publish(topic, &event))?;
        run.advance(Stage::Done, Ok(()))?;

        let markdown_chars = markdown.chars().count();
        info!(
            "Converted s3://{}/{} → {}[{}] ({} chars)",
            message.bucket, message.key, message.table, file_hash, markdown_chars
        );
        Ok(Completion {
            file_hash,
            bucket: message.bucket.clone(),
            key: message.key.clone(),
            table: message.table.clone(),
            format: format.to_string(),
            markdown_chars,
        })
    }

    /// Convert an embedded file without touching the stores.
    pub fn convert_direct(&self, payload: &DirectPayload) -> Result<DirectConversion> {
        let bytes = payload.decode()?;
        let format = match payload.file_name.as_deref() {
            Some(name) => self.policy.validate(name)?,
            None => DocumentFormat::sniff(&bytes).ok_or_else(|| {
                Error::UnsupportedType(format!(
                    "could not detect document type (supported: {})",
                    self.policy.extensions().join(", ")
                ))
            })?,
        };
        if !self.policy.allows(format) {
            return Err(Error::UnsupportedType(format!(".{}", format)));
        }

        info!("Converting embedded {} ({} bytes)", format, bytes.len());
        // Empty output is returned as-is; there is no record to protect here.
        let markdown = self.converter.convert(format, &bytes)?;
        Ok(DirectConversion {
            content_hash: content_hash(&bytes),
            size_bytes: bytes.len(),
            markdown,
            format,
        })
    }

    fn fetch(&self, format: DocumentFormat, message: &TriggerMessage) -> Result<Vec<u8>> {
        let object = self.objects.get(&message.bucket, &message.key)?;
        self.policy
            .check_content_type(format, object.content_type.as_deref())?;
        debug!(
            "Fetched {} bytes ({}, declared {})",
            object.bytes.len(),
            format,
            object.content_type.as_deref().unwrap_or("no content type")
        );
        Ok(object.bytes)
    }

    /// Convert for persistence: an empty result would complete the record with no text.
    fn convert(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
        let markdown = self.converter.convert(format, bytes)?;
        if markdown.trim().is_empty() {
            return Err(Error::Conversion(format!("no text extracted from {} document", format)));
        }
        Ok(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Persisted.to_string(), "persisted");
        assert_eq!(serde_json::to_value(Stage::Failed).unwrap(), "failed");
    }

    #[test]
    fn test_report_uses_index_without_message_id() {
        let mut report = BatchReport::default();
        report.record(
            3,
            None,
            Err(MessageFailure {
                reached: Stage::Validated,
                error: Error::ObjectNotFound { bucket: "b".into(), key: "h/a.pdf".into() },
                file_hash: Some("h".into()),
            }),
        );
        assert_eq!(report.processed, 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures[0].item_identifier, "3");
        assert_eq!(report.failures[0].code, "object_not_found");
        assert_eq!(report.failures[0].stage, Stage::Validated);
    }
}

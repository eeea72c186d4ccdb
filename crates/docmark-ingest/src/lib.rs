//! docmark Ingest — trigger parsing, type policy, conversion, and the ingestion worker.

pub mod convert;
pub mod handler;
pub mod key;
pub mod notify;
pub mod object;
pub mod policy;
pub mod trigger;
pub mod worker;

pub use convert::{DocumentConverter, MarkdownConverter};
pub use handler::{handle_invocation, InvocationResponse};
pub use notify::{channel_for_topic, CompletionEvent, FileTopicChannel, HttpTopicChannel, NotificationChannel};
pub use object::{FsObjectStore, ObjectStore, StoredObject};
pub use policy::{DocumentFormat, TypePolicy};
pub use trigger::{DirectPayload, Invocation, QueueRecord, TriggerMessage};
pub use worker::{BatchReport, Completion, IngestWorker, MessageFailure, RecordFailure, Stage};

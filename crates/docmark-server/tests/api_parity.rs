//! API parity tests — the JSON shapes returned to invokers and written for
//! downstream consumers.
//!
//! These build the real on-disk stack in a temp dir and call the invocation
//! handler directly (no HTTP server needed).

use std::sync::Arc;

use base64::Engine;
use serde_json::json;
use tempfile::TempDir;

use docmark_ingest::{
    handle_invocation, FileTopicChannel, FsObjectStore, IngestWorker, MarkdownConverter,
};
use docmark_store::{RecordStore, SqliteRecordStore};

fn worker(dir: &TempDir, topic: Option<&str>) -> (IngestWorker, Arc<FsObjectStore>, Arc<SqliteRecordStore>) {
    let objects = Arc::new(FsObjectStore::new(dir.path().join("objects")));
    let records = Arc::new(SqliteRecordStore::open(dir.path().join("records")).unwrap());
    let worker = IngestWorker::new(
        objects.clone(),
        records.clone(),
        Arc::new(FileTopicChannel::new(dir.path().join("topics"))),
        Arc::new(MarkdownConverter::new()),
    )
    .with_topic(topic.map(str::to_string));
    (worker, objects, records)
}

/// Invokers read `{statusCode, headers, body}`.
#[test]
fn test_invocation_response_envelope() {
    let dir = TempDir::new().unwrap();
    let (worker, _, _) = worker(&dir, Some("conversions"));
    let body = base64::engine::general_purpose::STANDARD.encode("<h1>Title</h1><p>Body</p>");

    let response = handle_invocation(&worker, &json!({ "body": body, "fileName": "page.html" }));
    let envelope = serde_json::to_value(&response).unwrap();

    assert_eq!(envelope["statusCode"], 200);
    assert_eq!(envelope["headers"]["Content-Type"], "text/markdown");
    assert!(envelope["headers"]["X-Content-Hash"].is_string());
    assert!(envelope["body"].as_str().unwrap().contains("Title"));
}

/// Partial batch failures list each failed item for redelivery.
#[test]
fn test_batch_failure_shape() {
    let dir = TempDir::new().unwrap();
    let (worker, objects, records) = worker(&dir, Some("conversions"));
    objects.put("b", "h1/page.html", b"<p>Fine</p>").unwrap();
    records.create_pending("t", "h1").unwrap();

    let response = handle_invocation(
        &worker,
        &json!({ "Records": [
            { "messageId": "ok", "body": "{\"bucket\":\"b\",\"key\":\"h1/page.html\",\"table\":\"t\"}" },
            { "messageId": "gdoc", "body": "{\"bucket\":\"b\",\"key\":\"h2/file.document\",\"table\":\"t\"}" },
        ]}),
    );
    assert_eq!(response.status_code, 500);

    let body = response.body_json();
    assert!(body["error"].is_string());
    assert_eq!(body["processed"], 2);
    assert_eq!(body["succeeded"], 1);
    let failure = &body["batchItemFailures"][0];
    assert_eq!(failure["itemIdentifier"], "gdoc");
    assert_eq!(failure["stage"], "received");
    assert_eq!(failure["code"], "export_required");
    assert_eq!(failure["fileHash"], "h2");
    assert!(failure["error"].as_str().unwrap().contains("Export"));
}

/// Downstream readers see camelCase Result Records.
#[test]
fn test_result_record_shape() {
    let dir = TempDir::new().unwrap();
    let (worker, objects, records) = worker(&dir, Some("conversions"));
    objects.put("b", "h1/page.html", b"<p>Stored text</p>").unwrap();
    records.create_pending("t", "h1").unwrap();

    let response = handle_invocation(
        &worker,
        &json!({ "Records": [{ "body": { "bucket": "b", "key": "h1/page.html", "table": "t" } }] }),
    );
    assert_eq!(response.status_code, 200);

    let record = serde_json::to_value(records.get("t", "h1").unwrap().unwrap()).unwrap();
    assert_eq!(record["fileHash"], "h1");
    assert_eq!(record["processingStatus"], "completed");
    assert_eq!(record["textContent"], "Stored text");
    assert!(record["createdAt"].is_number());
    assert!(record["updatedAt"].is_number());
}

/// Without a topic the queued path is a configuration error, not a partial batch.
#[test]
fn test_missing_topic_shape() {
    let dir = TempDir::new().unwrap();
    let (worker, _, _) = worker(&dir, None);

    let response = handle_invocation(
        &worker,
        &json!({ "Records": [{ "body": "{\"bucket\":\"b\",\"key\":\"h1/a.pdf\",\"table\":\"t\"}" }] }),
    );
    assert_eq!(response.status_code, 500);
    let body = response.body_json();
    assert_eq!(body["code"], "configuration");
    assert!(body.get("batchItemFailures").is_none());
}

//! Full pipeline against the filesystem object store, SQLite records and a
//! file-backed topic.

use std::io::{Cursor, Write};
use std::sync::Arc;

use base64::Engine;
use serde_json::json;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use docmark_ingest::{
    handle_invocation, FileTopicChannel, FsObjectStore, IngestWorker, MarkdownConverter,
    NotificationChannel, ObjectStore,
};
use docmark_store::{ProcessingStatus, RecordStore, SqliteRecordStore};

const TOPIC: &str = "conversions";

struct Pipeline {
    objects: Arc<FsObjectStore>,
    records: Arc<SqliteRecordStore>,
    topic: Arc<FileTopicChannel>,
    worker: IngestWorker,
    _dir: TempDir,
}

fn pipeline() -> Pipeline {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(FsObjectStore::new(dir.path().join("objects")));
    let records = Arc::new(SqliteRecordStore::open(dir.path().join("records")).unwrap());
    let topic = Arc::new(FileTopicChannel::new(dir.path().join("topics")));

    let worker = IngestWorker::new(
        objects.clone() as Arc<dyn ObjectStore>,
        records.clone() as Arc<dyn RecordStore>,
        topic.clone() as Arc<dyn NotificationChannel>,
        Arc::new(MarkdownConverter::new()),
    )
    .with_topic(Some(TOPIC.to_string()));

    Pipeline {
        objects,
        records,
        topic,
        worker,
        _dir: dir,
    }
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

fn queued(messages: &[serde_json::Value]) -> serde_json::Value {
    let records: Vec<_> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| json!({ "messageId": format!("m{}", i), "body": m.to_string() }))
        .collect();
    json!({ "Records": records })
}

#[test]
fn test_html_and_docx_batch_completes_rows_and_publishes() {
    let p = pipeline();
    p.objects
        .put(
            "uploads",
            "h1/page.html",
            b"<html><head><script>track()</script></head><body><p>Hello from HTML</p></body></html>",
        )
        .unwrap();
    p.objects
        .put("uploads", "h2/report.docx", &docx(&["First paragraph", "Second paragraph"]))
        .unwrap();
    assert!(p.records.create_pending("docs", "h1").unwrap());
    assert!(p.records.create_pending("docs", "h2").unwrap());

    let response = handle_invocation(
        &p.worker,
        &queued(&[
            json!({ "bucket": "uploads", "key": "h1/page.html", "table": "docs" }),
            json!({ "bucket": "uploads", "key": "h2/report.docx", "table": "docs" }),
        ]),
    );
    assert_eq!(response.status_code, 200, "body: {}", response.body);
    assert_eq!(
        response.body_json(),
        json!({ "message": "All records processed." })
    );

    let html = p.records.get("docs", "h1").unwrap().unwrap();
    assert_eq!(html.processing_status, ProcessingStatus::Completed);
    let text = html.text_content.unwrap();
    assert!(text.contains("Hello from HTML"));
    assert!(!text.contains("track()"));

    let word = p.records.get("docs", "h2").unwrap().unwrap();
    assert_eq!(word.processing_status, ProcessingStatus::Completed);
    assert_eq!(
        word.text_content.as_deref(),
        Some("First paragraph\n\nSecond paragraph")
    );
    assert!(word.updated_at.is_some());

    let events = p.topic.read_events(TOPIC).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].file_hash, "h1");
    assert_eq!(events[1].file_hash, "h2");
    assert_eq!(events[1].key, "h2/report.docx");
    assert_eq!(events[1].status, ProcessingStatus::Completed);
}

#[test]
fn test_missing_row_fails_without_event() {
    let p = pipeline();
    p.objects
        .put("uploads", "h3/page.html", b"<p>Orphan upload</p>")
        .unwrap();
    p.records.create_table("docs").unwrap();

    let response = handle_invocation(
        &p.worker,
        &queued(&[json!({ "bucket": "uploads", "key": "h3/page.html", "table": "docs" })]),
    );
    assert_eq!(response.status_code, 500);
    let body = response.body_json();
    assert_eq!(body["batchItemFailures"][0]["stage"], "converted");
    assert_eq!(body["batchItemFailures"][0]["code"], "persistence_failed");
    assert_eq!(body["batchItemFailures"][0]["fileHash"], "h3");

    assert!(p.records.get("docs", "h3").unwrap().is_none());
    assert!(p.topic.read_events(TOPIC).unwrap().is_empty());
}

#[test]
fn test_missing_object_leaves_row_pending() {
    let p = pipeline();
    p.records.create_pending("docs", "h4").unwrap();

    let response = handle_invocation(
        &p.worker,
        &queued(&[json!({ "bucket": "uploads", "key": "h4/gone.pdf", "table": "docs" })]),
    );
    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body_json()["batchItemFailures"][0]["code"],
        "object_not_found"
    );

    let row = p.records.get("docs", "h4").unwrap().unwrap();
    assert_eq!(row.processing_status, ProcessingStatus::Pending);
    assert!(row.text_content.is_none());
    assert!(p.topic.read_events(TOPIC).unwrap().is_empty());
}

#[test]
fn test_direct_docx_without_file_name_is_sniffed() {
    let p = pipeline();
    let encoded = base64::engine::general_purpose::STANDARD.encode(docx(&["Inline document"]));

    let response = handle_invocation(&p.worker, &json!({ "body": encoded }));
    assert_eq!(response.status_code, 200, "body: {}", response.body);
    assert_eq!(response.body, "Inline document");
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("text/markdown")
    );
    assert_eq!(response.headers["X-Content-Hash"].len(), 64);

    assert!(p.records.tables().unwrap().is_empty());
    assert!(p.topic.read_events(TOPIC).unwrap().is_empty());
}

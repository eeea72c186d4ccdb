//! Invocation boundary: event JSON in, `{statusCode, headers, body}` out.
//!
//! Every error stops here. It is logged and turned into a structured response.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{error, info};

use crate::trigger::Invocation;
use crate::worker::IngestWorker;
use docmark_core::Error;

/// HTTP-style result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl InvocationResponse {
    fn json(status_code: u16, body: serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, err: &Error) -> Self {
        Self::json(
            status_code,
            serde_json::json!({ "error": err.to_string(), "code": err.code() }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parse the body back into JSON (non-JSON bodies become a JSON string).
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|_| serde_json::Value::String(self.body.clone()))
    }
}

/// Handle one invocation event, direct or queued.
pub fn handle_invocation(worker: &IngestWorker, event: &serde_json::Value) -> InvocationResponse {
    let invocation = match Invocation::parse(event) {
        Ok(inv) => inv,
        Err(e) => {
            error!("Rejected invocation: {}", e);
            return InvocationResponse::error(400, &e);
        }
    };

    match invocation {
        Invocation::Direct(payload) => match worker.convert_direct(&payload) {
            Ok(conversion) => {
                info!(
                    "Direct conversion done: {} bytes {} → {} chars",
                    conversion.size_bytes,
                    conversion.format,
                    conversion.markdown.chars().count()
                );
                let mut headers = BTreeMap::new();
                headers.insert("Content-Type".to_string(), "text/markdown".to_string());
                headers.insert("X-Content-Hash".to_string(), conversion.content_hash);
                InvocationResponse {
                    status_code: 200,
                    headers,
                    body: conversion.markdown,
                }
            }
            Err(e) => {
                error!("Direct conversion failed: {}", e);
                // Anything past the request itself is the worker's fault.
                let status = if e.status_code() == 400 { 400 } else { 500 };
                InvocationResponse::error(status, &e)
            }
        },
        Invocation::Queued(records) => match worker.process_batch(&records) {
            Ok(report) if report.all_succeeded() => InvocationResponse::json(
                200,
                serde_json::json!({ "message": "All records processed." }),
            ),
            Ok(report) => InvocationResponse::json(
                500,
                serde_json::json!({
                    "error": format!(
                        "{} of {} records failed",
                        report.failures.len(),
                        report.processed
                    ),
                    "processed": report.processed,
                    "succeeded": report.succeeded,
                    "batchItemFailures": report.failures,
                }),
            ),
            Err(e) => {
                error!("Batch aborted before processing: {}", e);
                InvocationResponse::error(500, &e)
            }
        },
    }
}

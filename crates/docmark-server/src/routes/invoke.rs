//! Invocation endpoint: runs one event through the worker.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use docmark_core::Error;
use docmark_ingest::{handle_invocation, InvocationResponse};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/invoke", post(invoke))
}

/// POST /api/invoke — body is a direct or queued invocation event.
async fn invoke(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let invocation_id = uuid::Uuid::new_v4();
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            let err = Error::BadRequest(format!("event is not valid JSON: {}", e));
            warn!("Invocation {} rejected: {}", invocation_id, err);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string(), "code": err.code() })),
            )
                .into_response();
        }
    };
    info!("Invocation {} received", invocation_id);

    // Conversion, SQLite and the blocking HTTP client all block.
    let worker_state = state.clone();
    let result =
        tokio::task::spawn_blocking(move || handle_invocation(&worker_state.worker, &event)).await;

    match result {
        Ok(response) => {
            info!("Invocation {} finished: {}", invocation_id, response.status_code);
            into_http(response)
        }
        Err(e) => {
            error!("Invocation {} panicked: {}", invocation_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "invocation task failed" })),
            )
                .into_response()
        }
    }
}

fn into_http(response: InvocationResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, response.body).into_response();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            http.headers_mut().insert(name, value);
        }
    }
    http
}

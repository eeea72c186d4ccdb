//! Result record routes, for the upstream writer and for inspection.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};
use tracing::info;

use docmark_core::Error;
use docmark_store::schema::is_valid_table_name;
use docmark_store::RecordStore;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/records/{table}/{file_hash}",
        put(create_pending).get(get_record),
    )
}

/// PUT /api/records/{table}/{file_hash} — create a pending row (idempotent).
async fn create_pending(
    State(state): State<Arc<AppState>>,
    Path((table, file_hash)): Path<(String, String)>,
) -> impl IntoResponse {
    if let Err(rejection) = check_table(&table) {
        return rejection;
    }
    match state.records.create_pending(&table, &file_hash) {
        Ok(created) => {
            if created {
                info!("Pending record {}[{}] created", table, file_hash);
            }
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            (status, Json(serde_json::json!({ "created": created })))
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/records/{table}/{file_hash}
async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((table, file_hash)): Path<(String, String)>,
) -> impl IntoResponse {
    if let Err(rejection) = check_table(&table) {
        return rejection;
    }
    match state.records.get(&table, &file_hash) {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(serde_json::to_value(record).unwrap_or_default()),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("No record {}[{}]", table, file_hash) })),
        ),
        Err(e) => error_response(&e),
    }
}

fn check_table(table: &str) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if is_valid_table_name(table) {
        return Ok(());
    }
    Err(error_response(&Error::BadRequest(format!(
        "Invalid table name '{}'",
        table
    ))))
}

fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({ "error": err.to_string(), "code": err.code() })),
    )
}

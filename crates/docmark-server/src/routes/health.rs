//! Liveness and configuration summary.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// GET /api/health
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let tables = state.records.tables().unwrap_or_default();

    Json(serde_json::json!({
        "status": "ok",
        "topic": state.worker.topic(),
        "tables": tables,
        "extensions": state.worker.policy().extensions(),
        "startedAt": state.started_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::tests::{body_json, send, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_topic_and_tables() {
        let (state, _dir) = test_state(Some("conversions"));
        state.records.create_table("docs").unwrap();

        let response = send(state, "GET", "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["topic"], "conversions");
        assert_eq!(body["tables"], serde_json::json!(["docs"]));
        assert!(body["extensions"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!(".pdf")));
    }
}

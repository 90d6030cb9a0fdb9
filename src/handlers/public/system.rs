use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::middleware::ApiResponse;
use crate::server::AppState;

/// GET /ping
pub async fn ping() -> ApiResponse<()> {
    ApiResponse::message("pong")
}

/// GET /health - 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable",
                    }
                })),
            )
                .into_response()
        }
    }
}

//! Liveness and dependency health

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

/// Routes under `/health`
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Service liveness plus vector-store reachability
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health report"))
)]
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let store_health = state.vector_store.health_check().await;
    let body = match store_health {
        Ok(report) => serde_json::json!({
            "status": if report.healthy { "healthy" } else { "degraded" },
            "vector_store": {
                "healthy": report.healthy,
                "collections_count": report.collections_count,
                "detail": report.detail,
            },
        }),
        Err(e) => serde_json::json!({
            "status": "degraded",
            "vector_store": { "healthy": false, "detail": e.to_string() },
        }),
    };
    Ok(Json(body))
}

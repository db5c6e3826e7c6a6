//! Cache administration endpoint

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::delete;
use axum::{Json, Router};

/// Routes under `/cache`
pub fn routes() -> Router<AppState> {
    Router::new().route("/cache", delete(drop_caches))
}

/// Drop all cached BM25 indices and fused results; both rebuild
/// lazily on the next query
#[utoipa::path(
    delete,
    path = "/cache",
    responses((status = 200, description = "Caches dropped"))
)]
pub async fn drop_caches(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.bm25_cache.clear(None);
    state.retriever.clear_results_cache();
    Ok(Json(serde_json::json!({ "status": "success" })))
}

//! HTTP route assembly

pub mod cache;
pub mod health;
pub mod repos;

use crate::state::AppState;
use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(repos::routes())
        .merge(cache::routes())
        .merge(health::routes())
        .merge(SwaggerUi::new("/docs").url("/openapi.json", crate::openapi::ApiDoc::openapi()))
        .with_state(state)
}

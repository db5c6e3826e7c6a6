//! OpenAPI documentation

use utoipa::OpenApi;

/// API documentation served at `/docs`
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RepoInsight API",
        description = "Index GitHub repositories into per-repository vector \
                       collections and answer natural-language questions over \
                       them with hybrid retrieval.",
    ),
    paths(
        crate::routes::repos::analyze,
        crate::routes::repos::session_status,
        crate::routes::repos::cancel_analysis,
        crate::routes::repos::query,
        crate::routes::repos::query_status,
        crate::routes::repos::query_result,
        crate::routes::cache::drop_caches,
        crate::routes::health::health,
    ),
    components(schemas(
        crate::routes::repos::AnalyzeRequest,
        crate::routes::repos::QueuedResponse,
        crate::routes::repos::SessionStatusResponse,
        crate::routes::repos::CancelResponse,
    ))
)]
pub struct ApiDoc;

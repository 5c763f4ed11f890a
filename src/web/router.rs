//! Router configuration for the drive API.

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa::OpenApi;

use super::handlers::{self, AppState};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};
use super::openapi::ApiDoc;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    // Multipart bodies are bounded per file by the upload limits instead
    let upload_routes = Router::new()
        .route("/upload", post(handlers::upload))
        .layer(DefaultBodyLimit::disable());

    let drive_routes = Router::new()
        .route("/list", get(handlers::list))
        .route("/download", get(handlers::download))
        .route(
            "/file",
            put(handlers::put_file)
                .delete(handlers::delete)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/mkdir", post(handlers::mkdir))
        .route("/rename", put(handlers::rename))
        .route("/move", post(handlers::move_path))
        .route("/exists", get(handlers::exists))
        .merge(upload_routes);

    let api_routes = Router::new().nest("/drive", drive_routes);

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Span for one request. Records the path only, since download links carry
/// a token in the query string.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create a router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

//! Router configuration for the web interface.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{download_file, index, list_files, upload_files, AppState};

/// Create the main router.
///
/// Request bodies larger than `max_content_length` bytes are refused with 413.
pub fn create_router(app_state: Arc<AppState>, max_content_length: u64) -> Router {
    let body_limit = usize::try_from(max_content_length).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_files))
        .route("/files", get(list_files))
        .route("/files/*name", get(download_file))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

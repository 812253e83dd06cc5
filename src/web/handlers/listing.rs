//! Listing handler.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::pages::{render, FilesPage};

/// GET /files - List stored files, sorted by name.
///
/// A missing storage root lists as empty.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let store = state.store.clone();
    let names = tokio::task::spawn_blocking(move || store.list())
        .await?
        .map_err(|e| {
            tracing::error!("Failed to list files: {}", e);
            ApiError::from(e)
        })?;

    render(&FilesPage::new(names))
}

//! Download handler.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use std::sync::Arc;

use crate::file::sanitize_filename;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::stream::reader_stream;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters, double quotes and backslashes never reach the quoted
/// `filename` parameter; names outside that set also get an RFC 5987
/// `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// GET /files/*name - Download a stored file as an attachment.
///
/// The requested path is sanitized to a basename before anything touches the
/// filesystem, so traversal attempts collapse into the storage root. Names
/// with a disallowed extension are refused with 403 even if such a file was
/// placed on disk out of band.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(requested): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let safe_name = sanitize_filename(&requested);

    if !state.policy.is_allowed(&safe_name) {
        tracing::warn!(requested = %requested, resolved = %safe_name, "Download refused");
        return Err(ApiError::forbidden("File type not allowed"));
    }

    let store = state.store.clone();
    let name = safe_name.clone();
    let stored = tokio::task::spawn_blocking(move || store.open_for_read(&name)).await??;

    let content_type = mime_guess::from_path(&safe_name)
        .first_or_octet_stream()
        .to_string();

    tracing::debug!(name = %safe_name, bytes = stored.len, "Serving download");

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&safe_name),
        )
        .header(header::CONTENT_LENGTH, stored.len)
        .body(Body::from_stream(reader_stream(stored.reader)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

//! Upload handler.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    http::HeaderMap,
    response::Redirect,
};
use axum_extra::extract::cookie::SignedCookieJar;
use std::io;
use std::sync::Arc;

use crate::file::{sanitize_filename, ExtensionPolicy};
use crate::web::error::ApiError;
use crate::web::flash::{jar_from_headers, set_notices, Notice};
use crate::web::handlers::{AppState, SharedStore};
use crate::web::stream::ChannelReader;

/// Form field carrying a single file.
pub const SINGLE_FILE_FIELD: &str = "file";

/// Form field carrying any number of files.
pub const MULTI_FILE_FIELD: &str = "files";

/// Result of handling one submitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored under `stored_name`.
    Accepted { stored_name: String },
    /// Not stored.
    Rejected {
        original_name: String,
        reason: String,
    },
}

/// Decide where a submitted file may be stored.
///
/// The extension check runs on the name the client sent. The sanitized name
/// must also be non-empty and still carry an allowed extension, so nothing is
/// ever stored under a name that downloads would refuse.
pub fn vet_upload_name(
    policy: &ExtensionPolicy,
    original_name: &str,
) -> Result<String, UploadOutcome> {
    let reject = |reason: String| UploadOutcome::Rejected {
        original_name: original_name.to_string(),
        reason,
    };

    if !policy.is_allowed(original_name) {
        return Err(reject(format!("File type not allowed: {original_name}")));
    }

    let safe_name = sanitize_filename(original_name);
    if safe_name.is_empty() || !policy.is_allowed(&safe_name) {
        return Err(reject(format!("Invalid file name: {original_name}")));
    }

    Ok(safe_name)
}

/// Summarize the outcomes of one upload request as page notices.
pub fn upload_notices(outcomes: &[UploadOutcome]) -> Vec<Notice> {
    let mut saved = Vec::new();
    let mut errors = Vec::new();

    for outcome in outcomes {
        match outcome {
            UploadOutcome::Accepted { stored_name } => saved.push(stored_name.as_str()),
            UploadOutcome::Rejected { reason, .. } => errors.push(Notice::danger(reason.clone())),
        }
    }

    let mut notices = Vec::new();
    if saved.is_empty() && errors.is_empty() {
        notices.push(Notice::warning("No files selected."));
    }
    if !saved.is_empty() {
        notices.push(Notice::success(format!("Uploaded: {}", saved.join(", "))));
    }
    notices.extend(errors);
    notices
}

/// Stream one multipart field into the store under `name`.
///
/// The store writes on the blocking pool while chunks arrive here. A broken
/// request stream makes the store discard the partial file.
async fn save_field(store: SharedStore, name: String, mut field: Field<'_>) -> Result<u64, ApiError> {
    let (tx, mut reader) = ChannelReader::pair();

    let writer = tokio::task::spawn_blocking(move || store.save(&name, &mut reader));

    let mut read_error = None;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                // A closed channel means the store already gave up.
                if tx.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx
                    .send(Err(io::Error::other("upload stream interrupted")))
                    .await;
                read_error = Some(ApiError::from(e));
                break;
            }
        }
    }
    drop(tx);

    let saved = writer.await?;
    if let Some(e) = read_error {
        return Err(e);
    }
    saved.map_err(|e| {
        tracing::error!("Failed to save file: {}", e);
        ApiError::from(e)
    })
}

/// Store every file entry of the form, in arrival order.
///
/// Only the first `file` entry counts; text parts and unknown fields are
/// skipped. Entries submitted without a chosen file carry an empty filename.
async fn store_uploads(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Vec<UploadOutcome>, ApiError> {
    let mut outcomes = Vec::new();
    let mut seen_single = false;

    while let Some(field) = multipart.next_field().await? {
        let is_single = match field.name() {
            Some(SINGLE_FILE_FIELD) if !seen_single => true,
            Some(MULTI_FILE_FIELD) => false,
            _ => continue,
        };

        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if is_single {
            seen_single = true;
        }
        if original_name.is_empty() {
            continue;
        }

        match vet_upload_name(&state.policy, &original_name) {
            Ok(stored_name) => {
                let bytes = save_field(state.store.clone(), stored_name.clone(), field).await?;
                tracing::info!(
                    original = %original_name,
                    stored = %stored_name,
                    bytes,
                    "File uploaded"
                );
                outcomes.push(UploadOutcome::Accepted { stored_name });
            }
            Err(rejection) => {
                tracing::warn!(original = %original_name, "Upload rejected");
                outcomes.push(rejection);
            }
        }
    }

    Ok(outcomes)
}

/// POST /upload - Store files submitted through the upload form.
///
/// Request body: multipart/form-data with an optional `file` field and any
/// number of `files` fields. A request without a multipart body counts as no
/// files. Redirects to `/` with notices describing what was stored and what
/// was rejected.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(SignedCookieJar, Redirect), ApiError> {
    let outcomes = match multipart {
        Ok(multipart) => store_uploads(&state, multipart).await?,
        Err(rejection) => {
            tracing::debug!("Upload without multipart body: {}", rejection.body_text());
            Vec::new()
        }
    };

    let jar = set_notices(
        jar_from_headers(&headers, &state.flash_key),
        &state.notices,
        upload_notices(&outcomes),
    );
    Ok((jar, Redirect::to("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::flash::NoticeLevel;

    fn policy() -> ExtensionPolicy {
        ExtensionPolicy::new(["png", "pdf", "txt"])
    }

    fn accepted(name: &str) -> UploadOutcome {
        UploadOutcome::Accepted {
            stored_name: name.to_string(),
        }
    }

    #[test]
    fn test_vet_accepts_and_sanitizes() {
        let policy = policy();
        assert_eq!(vet_upload_name(&policy, "report.PDF").unwrap(), "report.PDF");
        assert_eq!(
            vet_upload_name(&policy, "../holiday photo.png").unwrap(),
            "holiday_photo.png"
        );
    }

    #[test]
    fn test_vet_rejects_extension_on_original_name() {
        let err = vet_upload_name(&policy(), "tool.exe").unwrap_err();
        assert_eq!(
            err,
            UploadOutcome::Rejected {
                original_name: "tool.exe".to_string(),
                reason: "File type not allowed: tool.exe".to_string(),
            }
        );

        assert!(vet_upload_name(&policy(), "README").is_err());
    }

    #[test]
    fn test_vet_rejects_names_that_sanitize_badly() {
        // Sanitizes to "png": no extension left.
        let err = vet_upload_name(&policy(), "日本.png").unwrap_err();
        assert!(matches!(
            err,
            UploadOutcome::Rejected { ref reason, .. } if reason == "Invalid file name: 日本.png"
        ));
    }

    #[test]
    fn test_notices_no_files() {
        let notices = upload_notices(&[]);
        assert_eq!(notices, vec![Notice::warning("No files selected.")]);
    }

    #[test]
    fn test_notices_mixed() {
        let outcomes = vec![
            accepted("a.png"),
            vet_upload_name(&policy(), "b.exe").unwrap_err(),
            accepted("c.txt"),
        ];

        let notices = upload_notices(&outcomes);

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], Notice::success("Uploaded: a.png, c.txt"));
        assert_eq!(notices[1].level, NoticeLevel::Danger);
        assert_eq!(notices[1].message, "File type not allowed: b.exe");
    }

    #[test]
    fn test_notices_only_rejections() {
        let outcomes = vec![
            vet_upload_name(&policy(), "x.bat").unwrap_err(),
            vet_upload_name(&policy(), "y.sh").unwrap_err(),
        ];

        let notices = upload_notices(&outcomes);

        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Danger));
    }
}

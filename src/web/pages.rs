//! HTML pages rendered with askama.

use askama::Template;
use axum::response::Html;

use super::error::ApiError;
use super::flash::Notice;

/// Upload form with pending notices and the allowed extensions.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub notices: Vec<Notice>,
    /// Sorted, comma-joined allowed extensions.
    pub allowed: String,
}

/// Link to a stored file.
pub struct FileLink {
    pub name: String,
    pub href: String,
}

impl FileLink {
    pub fn new(name: String) -> Self {
        let href = format!("/files/{}", urlencoding::encode(&name));
        Self { name, href }
    }
}

/// Listing of stored files.
#[derive(Template)]
#[template(path = "files.html")]
pub struct FilesPage {
    pub files: Vec<FileLink>,
}

impl FilesPage {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            files: names.into_iter().map(FileLink::new).collect(),
        }
    }
}

/// Render a page, mapping template failures to a 500.
pub fn render<T: Template>(page: &T) -> Result<Html<String>, ApiError> {
    page.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render page: {}", e);
        ApiError::internal("Failed to render page")
    })
}

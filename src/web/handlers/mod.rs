//! Request handlers for the Filedrop web surface.

pub mod download;
pub mod index;
pub mod listing;
mod state;
pub mod upload;

pub use download::{content_disposition_header, download_file};
pub use index::index;
pub use listing::list_files;
pub use state::{AppState, SharedStore};
pub use upload::{upload_files, upload_notices, vet_upload_name, UploadOutcome};

//! Web interface for Filedrop.
//!
//! Serves the upload form, the file listing and downloads over HTTP.

pub mod error;
pub mod flash;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod server;
pub mod stream;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;

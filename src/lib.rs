//! Filedrop - minimal web file storage.
//!
//! Accepts uploads from a browser form, keeps them in a single directory,
//! lists them and serves them back as downloads.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{FiledropError, Result};
pub use file::{sanitize_filename, DiskStore, ExtensionPolicy, FileStore, MemoryStore};
pub use web::WebServer;

//! File handling core for Filedrop.
//!
//! This module provides:
//! - Filename sanitization for client-supplied names
//! - The extension allowlist guarding uploads and downloads
//! - The storage accessor owning the on-disk files

mod memory;
mod policy;
mod sanitize;
mod storage;

pub use memory::MemoryStore;
pub use policy::ExtensionPolicy;
pub use sanitize::sanitize_filename;
pub use storage::{DiskStore, FileStore, StoredFile};

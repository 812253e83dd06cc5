//! Application state shared by the handlers.

use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use crate::file::{ExtensionPolicy, FileStore};
use crate::web::flash::{signing_key, NoticeStore};

/// Shared handle to the storage accessor.
pub type SharedStore = Arc<dyn FileStore>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage accessor; the only component touching stored files.
    pub store: SharedStore,
    /// Extension allowlist applied to uploads and downloads.
    pub policy: Arc<ExtensionPolicy>,
    /// Key signing the flash-notice cookie.
    pub flash_key: Key,
    /// Notices waiting for the next page view.
    pub notices: Arc<NoticeStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: SharedStore, policy: ExtensionPolicy, secret_key: &str) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            flash_key: signing_key(secret_key),
            notices: Arc::new(NoticeStore::new()),
        }
    }
}

//! One-shot notices carried across the upload redirect.
//!
//! Notices stay on the server in a [`NoticeStore`]; the browser only holds a
//! signed cookie naming the pending entry. The index page takes the entry
//! once and clears the cookie, so any number of notices fits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use uuid::Uuid;

/// Name of the cookie naming the pending notices.
pub const FLASH_COOKIE: &str = "filedrop_flash";

/// Undelivered notices are dropped after this long.
const NOTICE_TTL: Duration = Duration::from_secs(10 * 60);

/// Severity of a notice, mirrored as a CSS class on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Danger,
}

impl NoticeLevel {
    /// CSS class used when rendering the notice.
    pub fn css_class(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Danger => "danger",
        }
    }
}

/// A message shown once on the next page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Danger, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
struct PendingNotices {
    created: Instant,
    notices: Vec<Notice>,
}

/// Notices waiting for their next page view, keyed by a random id.
#[derive(Debug, Default)]
pub struct NoticeStore {
    pending: Mutex<HashMap<Uuid, PendingNotices>>,
}

impl NoticeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries not yet taken or expired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep `notices` and return the id to hand to the browser.
    pub fn put(&self, notices: Vec<Notice>) -> Uuid {
        self.put_at(notices, Instant::now())
    }

    /// Remove and return the notices stored under `id`.
    pub fn take(&self, id: &Uuid) -> Vec<Notice> {
        self.lock()
            .remove(id)
            .map(|entry| entry.notices)
            .unwrap_or_default()
    }

    fn put_at(&self, notices: Vec<Notice>, now: Instant) -> Uuid {
        let id = Uuid::new_v4();
        let mut pending = self.lock();
        pending.retain(|_, entry| now.duration_since(entry.created) <= NOTICE_TTL);
        pending.insert(
            id,
            PendingNotices {
                created: now,
                notices,
            },
        );
        id
    }

    // A poisoned map only ever holds complete entries.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PendingNotices>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Derive the cookie signing key from the configured secret.
///
/// SHA-512 yields exactly the 64 bytes [`Key`] needs, whatever the secret
/// length.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Build a signed jar over the request cookies.
pub fn jar_from_headers(headers: &HeaderMap, key: &Key) -> SignedCookieJar {
    SignedCookieJar::from_headers(headers, key.clone())
}

/// Queue `notices` for the next page view and point the jar at them.
///
/// Notices a previous request left pending under this jar are discarded.
pub fn set_notices(
    jar: SignedCookieJar,
    store: &NoticeStore,
    notices: Vec<Notice>,
) -> SignedCookieJar {
    if let Some(previous) = pending_id(&jar) {
        store.take(&previous);
    }

    let id = store.put(notices);
    let cookie = Cookie::build((FLASH_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Take the pending notices named by the jar.
///
/// Returns the jar with the cookie removed; a missing, tampered, stale or
/// already-consumed cookie yields no notices.
pub fn take_notices(jar: SignedCookieJar, store: &NoticeStore) -> (SignedCookieJar, Vec<Notice>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let notices = pending_id(&jar)
        .map(|id| store.take(&id))
        .unwrap_or_default();

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, notices)
}

fn pending_id(jar: &SignedCookieJar) -> Option<Uuid> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

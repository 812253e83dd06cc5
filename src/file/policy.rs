//! Extension allowlist.

use std::collections::BTreeSet;

/// Immutable set of file extensions that may be stored or served.
///
/// Built once at startup and shared by every handler. Extensions are kept
/// lower-case and sorted, so membership checks are case-insensitive and
/// [`ExtensionPolicy::describe`] is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    allowed: BTreeSet<String>,
}

impl ExtensionPolicy {
    /// Create a policy from a list of extensions.
    ///
    /// Entries are trimmed, lower-cased and stripped of a leading `.`; blanks
    /// are ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { allowed }
    }

    /// Check whether `name` carries an allowed extension.
    ///
    /// The extension is whatever follows the last `.`, compared
    /// case-insensitively. Names without a `.` are never allowed.
    pub fn is_allowed(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) => self.allowed.contains(&ext.to_lowercase()),
            None => false,
        }
    }

    /// Iterate over the allowed extensions in ascending order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Human-readable, sorted, comma-joined list of extensions.
    pub fn describe(&self) -> String {
        self.extensions().collect::<Vec<_>>().join(", ")
    }
}

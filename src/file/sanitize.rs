//! Filename sanitization.
//!
//! Turns an arbitrary client-supplied filename into a basename that is safe to
//! join onto the storage root.

use unicode_normalization::UnicodeNormalization;

/// Basenames reserved by Windows; a stored file must never shadow one there.
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Sanitize a client-supplied filename.
///
/// Rules, applied in order:
/// 1. The name is NFKD-normalized and whatever is still non-ASCII is
///    dropped, so accented letters keep their base letter.
/// 2. Path separators (`/`, `\`) become whitespace, so directory components
///    can never survive as separators.
/// 3. Whitespace runs are collapsed into single underscores.
/// 4. Every character outside `[A-Za-z0-9._-]` is removed (this includes NUL
///    and other control characters).
/// 5. Leading and trailing `.` and `_` are stripped, which removes `..`
///    and hidden-file prefixes.
/// 6. On Windows, a device name (`CON`, `NUL.txt`, ...) gets a `_` prefix.
///
/// The result may be empty; callers must treat that as a rejection.
///
/// ```
/// use filedrop::file::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My cool movie.mov"), "My_cool_movie.mov");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// assert_eq!(sanitize_filename("../.."), "");
/// assert_eq!(sanitize_filename("résumé.pdf"), "resume.pdf");
/// ```
pub fn sanitize_filename(raw: &str) -> String {
    let spaced: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined.chars().filter(|&c| is_safe_char(c)).collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    if cfg!(windows) && is_device_name(trimmed) {
        return format!("_{trimmed}");
    }

    trimmed.to_string()
}

/// Whether the part before the first `.` is a Windows device name.
fn is_device_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or_default();
    !stem.is_empty()
        && WINDOWS_DEVICE_NAMES
            .iter()
            .any(|dev| dev.eq_ignore_ascii_case(stem))
}

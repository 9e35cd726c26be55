//! Request URL construction.

use once_cell::sync::Lazy;
use regex::Regex;

/// A slash followed by more slashes, unless it is part of `scheme://`.
static REPEATED_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^:]/)/+").unwrap());

/// Join `host` and `path` into a fully qualified URL.
///
/// A scheme already present on the host is kept; otherwise `https://` (or
/// `http://` when `secure` is false) is prefixed. Runs of slashes outside
/// the scheme marker collapse to one.
pub fn build_url(host: &str, path: &str, secure: bool) -> String {
    let mut constructed = format!("{}{}", host, path);

    if !constructed.starts_with("https://") && !constructed.starts_with("http://") {
        let scheme = if secure { "https://" } else { "http://" };
        constructed.insert_str(0, scheme);
    }

    REPEATED_SLASHES.replace_all(&constructed, "$1").into_owned()
}

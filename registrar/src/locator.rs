//! Storage-relative file ids from catalog URIs.
//!
//! Catalogs may record a full access URL (`https://host/videos/a.mp4`) where
//! the registration API wants the path on the pre-mounted storage
//! (`/videos/a.mp4`). Bare paths pass through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Generic URL scheme: a letter, then letters, digits, `+`, `-` or `.`, then `:`.
static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Return the path component of `storage_file_id` when it carries a URL scheme,
/// otherwise return it unchanged.
///
/// Total over all strings: malformed input is never an error.
///
/// # Example
/// ```
/// use marcload::strip_server_url;
///
/// assert_eq!(strip_server_url("https://host/a/b.mp4"), "/a/b.mp4");
/// assert_eq!(strip_server_url("/a/b.mp4"), "/a/b.mp4");
/// ```
pub fn strip_server_url(storage_file_id: &str) -> &str {
    let Some(scheme) = SCHEME.find(storage_file_id) else {
        return storage_file_id;
    };
    let mut rest = &storage_file_id[scheme.end()..];

    // Network location
    if let Some(after) = rest.strip_prefix("//") {
        let netloc_end = after.find(['/', '?', '#']).unwrap_or(after.len());
        rest = &after[netloc_end..];
    }

    // Fragment, then query
    if let Some(i) = rest.find('#') {
        rest = &rest[..i];
    }
    if let Some(i) = rest.find('?') {
        rest = &rest[..i];
    }

    // Parameters of the last segment
    let last_segment = rest.rfind('/').unwrap_or(0);
    if let Some(i) = rest[last_segment..].find(';') {
        rest = &rest[..last_segment + i];
    }

    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_stripped_to_path() {
        assert_eq!(strip_server_url("https://host/a/b.mp4"), "/a/b.mp4");
        assert_eq!(strip_server_url("http://host:8080/data/x.mkv"), "/data/x.mkv");
        assert_eq!(strip_server_url("ftp://user@host/x.mov"), "/x.mov");
    }

    #[test]
    fn test_bare_path_is_unchanged() {
        assert_eq!(strip_server_url("/a/b.mp4"), "/a/b.mp4");
        assert_eq!(strip_server_url("a/b.mp4"), "a/b.mp4");
        assert_eq!(strip_server_url(""), "");
        assert_eq!(strip_server_url("//host/a.mp4"), "//host/a.mp4");
        assert_eq!(strip_server_url("1abc:/x"), "1abc:/x");
    }

    #[test]
    fn test_query_fragment_and_params_dropped() {
        assert_eq!(strip_server_url("https://host/a/b.mp4?token=1#t=10"), "/a/b.mp4");
        assert_eq!(strip_server_url("https://host/a;v=1/b.mp4;type=video"), "/a;v=1/b.mp4");
        assert_eq!(strip_server_url("https://host?x=1"), "");
    }

    #[test]
    fn test_url_without_path() {
        assert_eq!(strip_server_url("https://host"), "");
        assert_eq!(strip_server_url("https://"), "");
    }

    #[test]
    fn test_path_is_not_decoded() {
        assert_eq!(strip_server_url("https://host/a%20b.mp4"), "/a%20b.mp4");
        assert_eq!(strip_server_url("https://host/a b.mp4"), "/a b.mp4");
    }

    #[test]
    fn test_scheme_without_authority() {
        assert_eq!(strip_server_url("file:/mnt/storage/a.mp4"), "/mnt/storage/a.mp4");
        assert_eq!(strip_server_url("s3:bucket/a.mp4"), "bucket/a.mp4");
    }

    #[test]
    fn test_non_ascii_input_is_total() {
        assert_eq!(strip_server_url("ścieżka/plik.mp4"), "ścieżka/plik.mp4");
        assert_eq!(strip_server_url("https://hóst/ścieżka.mp4"), "/ścieżka.mp4");
    }
}

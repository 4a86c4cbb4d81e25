//! URL helper functions

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped inside a single path segment (RFC 3986 unreserved are kept)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for("https://example.com/", "/blog") // -> "https://example.com/blog"
/// ```
pub fn full_url_for(site_url: &str, path: &str) -> String {
    let base = site_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Route to a post detail page
///
/// # Examples
/// ```ignore
/// post_path("hello world") // -> "/blog/hello%20world"
/// ```
pub fn post_path(id: &str) -> String {
    format!("/blog/{}", encode_segment(id))
}

/// Percent-encode a value for use as one path segment
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Decode a percent-encoded path segment; `None` when the bytes are not UTF-8
pub fn decode_segment(value: &str) -> Option<String> {
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

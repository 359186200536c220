//! Bus subject derivation from HTTP request lines.

use axum::http::Method;

/// Derive the request subject for an HTTP method and path.
///
/// The method is lowercased and each non-empty path segment becomes one
/// subject token, so `GET /api/widgets/42` maps to `get.api.widgets.42`.
/// The query string never participates; handlers that need it read the
/// envelope instead.
pub fn derive(method: &Method, path: &str) -> String {
    let mut subject = method.as_str().to_ascii_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        subject.push('.');
        subject.push_str(&sanitize_token(segment));
    }
    subject
}

/// Make one path segment safe as a subject token.
///
/// Percent-escapes survive the trip from the URL, so the segment is decoded
/// first and every byte outside `[A-Za-z0-9_-]` is re-escaped as uppercase
/// `%XX`. `.`, `*`, `>` and whitespace therefore never reach the bus as
/// structural characters, and URL-equivalent segments collapse to the same
/// token.
fn sanitize_token(segment: &str) -> String {
    let decoded = urlencoding::decode_binary(segment.as_bytes());
    let mut token = String::with_capacity(decoded.len());
    for &byte in decoded.iter() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-' => token.push(byte as char),
            _ => token.push_str(&format!("%{byte:02X}")),
        }
    }
    token
}

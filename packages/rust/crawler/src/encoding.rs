//! Response body decoding.
//!
//! Charset precedence: byte order mark, then the `Content-Type` header, then a
//! `<meta>` declaration near the top of the document, then UTF-8. Bytes that
//! are invalid in the chosen encoding become U+FFFD.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

/// Only the head of the document is scanned for a `<meta>` charset.
const META_SCAN_LIMIT: usize = 1024;

/// `charset=` parameter of a `Content-Type` header value.
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// `<meta charset="...">` and `<meta http-equiv="Content-Type" content="...; charset=...">`.
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s/>;]+)"#).expect("valid regex")
});

/// Pick the encoding of an HTML response body.
pub fn detect_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) = content_type.and_then(|ct| find_label(&HEADER_CHARSET_RE, ct)) {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(META_SCAN_LIMIT)]);
    find_label(&META_CHARSET_RE, &head)
        // A UTF-16 label in ASCII-readable markup is wrong by construction.
        .map(Encoding::output_encoding)
        .unwrap_or(UTF_8)
}

/// Decode `body` to UTF-8 text, returning the encoding that was used.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(content_type, body);
    let (text, used, _had_errors) = encoding.decode(body);
    (text.into_owned(), used)
}

fn find_label(re: &Regex, haystack: &str) -> Option<&'static Encoding> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
}

//! Request path to object key resolution

use percent_encoding::percent_decode_str;

/// Malformed request path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("malformed percent-encoding at byte {0}")]
    BadEscape(usize),
    #[error("decoded path is not valid UTF-8")]
    InvalidUtf8,
}

/// Percent-decode a URL path
///
/// Every `%` must introduce two hex digits; anything else is rejected rather
/// than passed through.
pub fn decode_path(raw: &str) -> Result<String, PathError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(PathError::BadEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| PathError::InvalidUtf8)
}

/// Object key for a decoded path: a single leading `/` is dropped and the root
/// maps to the empty key
pub fn resolve_key(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Join a relative name onto a directory key, normalizing `.`, `..` and
/// repeated separators
///
/// `..` never climbs above the container root.
pub fn join_key(dir: &str, name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(name.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

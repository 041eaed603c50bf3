//! HTTP cache control module
//!
//! Provides `ETag` generation, `Cache-Control` values and conditional request handling.

use super::headers::{parse_http_date, HeaderSet};
use crate::store::ObjectMeta;
use chrono::{DateTime, Utc};
use hyper::header::ETAG;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default `max-age` in seconds when caching is enabled
pub const DEFAULT_MAX_AGE: u32 = 3600;

/// Generate `ETag` using fast hashing
///
/// # Arguments
/// * `content` - Object content
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Convert a max-age to the `Cache-Control` header value
pub fn cache_control_value(max_age: u32) -> String {
    format!("max-age={max_age}")
}

/// Client validators taken from a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// Raw `If-None-Match` value
    pub if_none_match: Option<String>,
    /// Parsed `If-Modified-Since`; unparseable dates count as absent
    pub if_modified_since: Option<DateTime<Utc>>,
}

impl Validators {
    pub fn new(if_none_match: Option<&str>, if_modified_since: Option<&str>) -> Self {
        Self {
            if_none_match: if_none_match.map(ToString::to_string),
            if_modified_since: if_modified_since.and_then(parse_http_date),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }
}

/// Decide whether a response can be answered with 304 Not Modified
///
/// At least one validator must be present and every present validator must hold:
/// - `If-None-Match` equals the composed `ETag` byte for byte (no weak comparison)
/// - `If-Modified-Since` is at or after the object's modification time
///
/// HTTP dates carry whole seconds, so the object time is truncated before comparing.
pub fn is_not_modified(validators: &Validators, headers: &HeaderSet, meta: &ObjectMeta) -> bool {
    if validators.is_empty() {
        return false;
    }

    let etag_ok = validators
        .if_none_match
        .as_deref()
        .is_none_or(|client_etag| headers.get(&ETAG) == Some(client_etag));

    let mtime_ok = validators
        .if_modified_since
        .is_none_or(|since| since.timestamp() >= meta.last_modified.timestamp());

    etag_ok && mtime_ok
}

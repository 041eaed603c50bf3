//! Response header composition module
//!
//! A response header set is built fresh for every response from three layers,
//! later layers overriding earlier ones:
//! 1. server defaults (`Server`, `Cache-Control`)
//! 2. statically configured custom headers
//! 3. per-response headers computed from object metadata
//!
//! The `Server` header is applied after all layers so it can never be overridden.

use crate::logger;
use crate::store::ObjectMeta;
use chrono::{DateTime, NaiveDateTime, Utc};
use hyper::header::{
    AsHeaderName, HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_LANGUAGE,
    CONTENT_LENGTH, CONTENT_LOCATION, CONTENT_RANGE, CONTENT_TYPE, DATE, ETAG, EXPIRES,
    LAST_MODIFIED, SERVER,
};

/// `Content-MD5` has no constant in the `http` crate
pub const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Headers describing the body itself, which a 304 response must not carry
pub const ENTITY_HEADERS: [HeaderName; 9] = [
    CONTENT_ENCODING,
    CONTENT_LANGUAGE,
    CONTENT_LENGTH,
    CONTENT_LOCATION,
    CONTENT_MD5,
    CONTENT_RANGE,
    CONTENT_TYPE,
    EXPIRES,
    LAST_MODIFIED,
];

/// Format used for `Date` and `Last-Modified` (IMF-fixdate)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Ordered, case-insensitive response header set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(HeaderMap);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header set from string pairs, rejecting invalid names or values
    pub fn try_from_pairs<'a, I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("Invalid header name '{name}': {e}"))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| format!("Invalid value for header '{name}': {e}"))?;
            set.0.insert(name, value);
        }
        Ok(set)
    }

    /// Set a header, replacing any previous value
    ///
    /// Values that are not valid header text are dropped with a warning.
    pub fn insert(&mut self, name: HeaderName, value: impl AsRef<str>) {
        let value = value.as_ref();
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.0.insert(name, v);
            }
            Err(e) => {
                logger::log_warning(&format!(
                    "Dropping header {name}: invalid value {value:?}: {e}"
                ));
            }
        }
    }

    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.0.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn contains<K: AsHeaderName>(&self, name: K) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> Option<HeaderValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.0.iter()
    }

    /// Overlay `other` on top of this set; its values win
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Append a token to a comma-separated list header such as `Vary`
    ///
    /// An existing value is preserved; the token is not added twice.
    pub fn append_token(&mut self, name: HeaderName, token: &str) {
        let merged = match self.get(&name) {
            Some(existing) if existing.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)) => {
                return;
            }
            Some(existing) if !existing.trim().is_empty() => format!("{existing}, {token}"),
            _ => token.to_string(),
        };
        self.insert(name, merged);
    }

    /// Remove every entity header (used for 304 responses)
    pub fn strip_entity_headers(&mut self) {
        for name in &ENTITY_HEADERS {
            self.0.remove(name);
        }
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.0
    }
}

/// Merge the three header layers and stamp the server identification last
pub fn compose(
    defaults: &HeaderSet,
    custom: &HeaderSet,
    computed: &HeaderSet,
    server_info: &str,
) -> HeaderSet {
    let mut headers = defaults.clone();
    headers.merge(custom);
    headers.merge(computed);
    headers.insert(SERVER, server_info);
    headers
}

/// Per-response headers derived from object metadata
///
/// `size` is passed separately because a substituted variant may differ from
/// the object the metadata describes.
pub fn object_headers(
    meta: &ObjectMeta,
    content_type: &str,
    size: u64,
    now: DateTime<Utc>,
) -> HeaderSet {
    let mut headers = HeaderSet::new();
    headers.insert(ETAG, &meta.etag);
    headers.insert(DATE, http_date(now));
    headers.insert(LAST_MODIFIED, http_date(meta.last_modified));
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CONTENT_LENGTH, size.to_string());
    headers
}

/// Format a timestamp as an HTTP date
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date; returns `None` for anything unparseable
///
/// Accepts IMF-fixdate / RFC 2822, and RFC 3339 as a lenient fallback.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc2822(value) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        return Some(t.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

//! Precompressed variant selection
//!
//! When the client accepts gzip and the policy allows the content type, a
//! sibling object `<key>.gz` is served in place of the original if it exists.

use super::observer::Observer;
use crate::config::GzipPolicy;
use crate::http::HeaderSet;
use crate::store::{ObjectMeta, ObjectStore};
use hyper::header::{CONTENT_ENCODING, VARY};

/// Whether an `Accept-Encoding` value admits gzip
///
/// A plain substring check: quality values are not interpreted.
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    accept_encoding.is_some_and(|value| value.contains("gzip"))
}

/// Whether a gzip lookup should be attempted at all
pub fn is_eligible(
    policy: &GzipPolicy,
    content_type: &str,
    file_count: usize,
    accept_encoding: Option<&str>,
) -> bool {
    file_count == 1 && policy.allows(content_type) && accepts_gzip(accept_encoding)
}

/// Look up the `.gz` sibling of `key`; a miss is not an error
pub async fn find_variant(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    observer: &dyn Observer,
) -> Option<ObjectMeta> {
    let gz_key = format!("{key}.gz");
    match store.properties(container, &gz_key).await {
        Ok(meta) => {
            observer.info(&format!(
                "Serving {gz_key} to gzip-capable client instead of {key} ({} bytes)",
                meta.size
            ));
            Some(meta)
        }
        Err(e) => {
            observer.info(&format!("No gzip variant for {key}: {e}"));
            None
        }
    }
}

/// Mark a response as carrying the gzip variant
pub fn apply_encoding(headers: &mut HeaderSet) {
    headers.insert(CONTENT_ENCODING, "gzip");
    headers.append_token(VARY, "Accept-Encoding");
}

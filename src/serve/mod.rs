//! Object serving module
//!
//! Resolves request paths against an object store and produces responses with
//! cache validation, directory index fallback and optional gzip substitution.
//!
//! Request flow:
//! 1. decode the path (400 on malformed escapes) and check the method (405)
//! 2. walk the fallback chain: exact key, `index.html`, `index.htm` (301 / 404)
//! 3. pick a gzip variant, compose headers, answer 304 when validators match
//! 4. stream the body and finish exactly once

pub mod error;
pub mod fallback;
pub mod finish;
pub mod gzip;
pub mod observer;
pub mod path;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorKind, ServeError, ServeResult};
pub use fallback::{FallbackState, Resolution};
pub use finish::{ErrorMode, Finisher, ResponseWriter};
pub use observer::{LogObserver, NullObserver, Observer};
pub use path::PathError;

use crate::config::ServeConfig;
use crate::http::cache::{self, Validators};
use crate::http::headers::{self, HeaderSet};
use crate::http::mime;
use crate::store::{ObjectMeta, ObjectStore};
use chrono::Utc;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, ALLOW, CONTENT_TYPE, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, LOCATION,
};
use hyper::{Method, StatusCode, Uri};
use std::sync::Arc;

/// Immutable view of an inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Request target as sent: path plus optional query
    pub url: String,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let url = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        Self {
            method: method.clone(),
            url: url.to_string(),
            headers: headers.clone(),
        }
    }

    /// Add a client header; invalid values are ignored
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Raw (still percent-encoded) path component of the URL
    pub fn path(&self) -> &str {
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        &self.url[..end]
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn validators(&self) -> Validators {
        Validators::new(self.header(&IF_NONE_MATCH), self.header(&IF_MODIFIED_SINCE))
    }
}

/// What to send for a resolved object
struct Reply {
    status: StatusCode,
    /// Per-response headers supplied by the caller
    headers: HeaderSet,
    files: Vec<String>,
    meta: ObjectMeta,
}

/// Serves objects from one store under a fixed configuration
#[derive(Clone)]
pub struct StaticServer {
    store: Arc<dyn ObjectStore>,
    config: Arc<ServeConfig>,
    defaults: HeaderSet,
    observer: Arc<dyn Observer>,
}

impl StaticServer {
    pub fn new(store: Arc<dyn ObjectStore>, config: ServeConfig) -> Self {
        Self {
            store,
            defaults: config.default_headers(),
            config: Arc::new(config),
            observer: Arc::new(NullObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    fn container<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.config.container)
    }

    /// Serve a request, writing error responses directly
    pub async fn serve<W: ResponseWriter>(
        &self,
        container: Option<&str>,
        req: &RequestContext,
        writer: &mut W,
    ) -> Result<ServeResult, ServeError> {
        self.serve_with(container, req, writer, ErrorMode::Respond)
            .await
    }

    /// Serve a request with an explicit error rendering mode
    pub async fn serve_with<W: ResponseWriter>(
        &self,
        container: Option<&str>,
        req: &RequestContext,
        writer: &mut W,
        mode: ErrorMode,
    ) -> Result<ServeResult, ServeError> {
        let container = self.container(container);
        let finisher = Finisher::new(writer, req.method.clone(), mode, &self.config.server_info);

        let raw_path = req.path();
        let decoded = match path::decode_path(raw_path) {
            Ok(p) => p,
            Err(e) => {
                self.observer.log(&format!("Rejecting path {raw_path:?}: {e}"));
                return finisher.finish(StatusCode::BAD_REQUEST, HeaderSet::new(), Some(e.into()));
            }
        };

        if req.method != Method::GET && req.method != Method::HEAD {
            let mut headers = HeaderSet::new();
            headers.insert(ALLOW, "GET, HEAD");
            return finisher.finish(
                StatusCode::METHOD_NOT_ALLOWED,
                headers,
                Some(ErrorKind::MethodNotAllowed(req.method.clone())),
            );
        }

        let key = path::resolve_key(&decoded);
        let resolution =
            fallback::resolve(&*self.store, container, key, raw_path, &*self.observer).await;

        match resolution {
            Resolution::Hit { key, meta } => {
                let reply = Reply {
                    status: StatusCode::OK,
                    headers: HeaderSet::new(),
                    files: vec![key],
                    meta,
                };
                self.respond(container, req, finisher, reply).await
            }
            Resolution::Redirect { location } => {
                let mut headers = HeaderSet::new();
                headers.insert(LOCATION, location);
                finisher.finish(StatusCode::MOVED_PERMANENTLY, headers, None)
            }
            Resolution::NotFound => finisher.finish(
                StatusCode::NOT_FOUND,
                HeaderSet::new(),
                Some(ErrorKind::NotFound(decoded)),
            ),
        }
    }

    /// Serve one specific object with a caller-chosen status and headers
    ///
    /// No directory fallback applies. A missing object is reported as
    /// `NotFound` without writing anything, so the caller can render its own
    /// response. A `Content-Type` in `headers` overrides extension detection.
    pub async fn serve_file<W: ResponseWriter>(
        &self,
        container: Option<&str>,
        path: &str,
        status: StatusCode,
        headers: HeaderSet,
        req: &RequestContext,
        writer: &mut W,
    ) -> Result<ServeResult, ServeError> {
        let container = self.container(container);
        let key = path::resolve_key(path).to_string();

        let meta = match self.store.properties(container, &key).await {
            Ok(meta) => meta,
            Err(e) => {
                self.observer.info(&format!("serve_file {container}/{key}: {e}"));
                let finisher = Finisher::new(
                    writer,
                    req.method.clone(),
                    ErrorMode::Caller,
                    &self.config.server_info,
                );
                return finisher.finish(
                    StatusCode::NOT_FOUND,
                    HeaderSet::new(),
                    Some(ErrorKind::NotFound(key)),
                );
            }
        };

        let finisher = Finisher::new(
            writer,
            req.method.clone(),
            ErrorMode::Respond,
            &self.config.server_info,
        );
        let reply = Reply {
            status,
            headers,
            files: vec![key],
            meta,
        };
        self.respond(container, req, finisher, reply).await
    }

    /// Compose headers, answer 304 or stream the body
    async fn respond<W: ResponseWriter>(
        &self,
        container: &str,
        req: &RequestContext,
        mut finisher: Finisher<'_, W>,
        reply: Reply,
    ) -> Result<ServeResult, ServeError> {
        let Reply {
            status,
            headers: extra,
            mut files,
            meta,
        } = reply;

        let primary = files.first().cloned().unwrap_or_default();
        let content_type = extra
            .get(CONTENT_TYPE)
            .unwrap_or_else(|| mime::content_type_for_key(&primary))
            .to_string();

        let mut size = meta.size;
        let mut gzipped = false;
        if gzip::is_eligible(
            &self.config.gzip,
            &content_type,
            files.len(),
            req.header(&ACCEPT_ENCODING),
        ) {
            if let Some(variant) =
                gzip::find_variant(&*self.store, container, &primary, &*self.observer).await
            {
                size = variant.size;
                files = vec![variant.key];
                gzipped = true;
            }
        }

        let mut computed = headers::object_headers(&meta, &content_type, size, Utc::now());
        computed.merge(&extra);
        let mut headers = headers::compose(
            &self.defaults,
            &self.config.headers,
            &computed,
            &self.config.server_info,
        );
        if gzipped {
            gzip::apply_encoding(&mut headers);
        }

        if cache::is_not_modified(&req.validators(), &headers, &meta) {
            headers.strip_entity_headers();
            return finisher.finish(StatusCode::NOT_MODIFIED, headers, None);
        }

        finisher.write_head(status, &headers);
        if *finisher.method() == Method::GET {
            let streamed =
                stream::stream_objects(&*self.store, container, None, &files, finisher.writer())
                    .await;
            if let Err(failure) = streamed {
                self.observer.log(&format!("Aborting response for {primary}: {failure}"));
                return finisher.finish(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    HeaderSet::new(),
                    Some(failure),
                );
            }
        }
        finisher.finish(status, headers, None)
    }
}

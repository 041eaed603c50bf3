//! Request outcome types
//!
//! Every request ends in exactly one [`ServeResult`], either as the success value
//! or wrapped in a [`ServeError`].

use super::path::PathError;
use crate::http::HeaderSet;
use crate::store::StoreError;
use hyper::{Method, StatusCode};

/// Final status, headers and reason phrase of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeResult {
    pub status: StatusCode,
    pub headers: HeaderSet,
    pub message: &'static str,
}

impl ServeResult {
    pub fn new(status: StatusCode, headers: HeaderSet) -> Self {
        Self {
            status,
            headers,
            message: status.canonical_reason().unwrap_or(""),
        }
    }
}

/// Why a request ended with an error status
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    BadPath(#[from] PathError),

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("no object found for `{0}`")]
    NotFound(String),

    #[error("streaming `{key}` failed: {source}")]
    StreamFailure {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Caller-chosen error status, e.g. a custom error page
    #[error("served with error status {0}")]
    Status(StatusCode),
}

/// Error outcome of a request
///
/// `written` tells whether the response head already went to the client; when
/// it is false the caller owns rendering the response.
#[derive(Debug, thiserror::Error)]
#[error("{reason} ({})", .response.status)]
pub struct ServeError {
    #[source]
    pub reason: ErrorKind,
    pub response: ServeResult,
    pub written: bool,
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        self.response.status
    }
}

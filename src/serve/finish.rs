//! Response finishing
//!
//! [`Finisher`] is the single terminal point of a request. It is consumed by
//! [`Finisher::finish`], so a request cannot be completed twice.

use super::error::{ErrorKind, ServeError, ServeResult};
use crate::http::HeaderSet;
use crate::store::ObjectSink;
use hyper::header::SERVER;
use hyper::{Method, StatusCode};

/// The HTTP response being produced for one request
///
/// Body bytes arrive through [`ObjectSink::write_chunk`]. `end` must tolerate
/// being called more than once.
pub trait ResponseWriter: ObjectSink {
    /// Send the status line and headers
    fn write_head(&mut self, status: StatusCode, headers: &HeaderSet);
    /// Complete the body
    fn end(&mut self);
    /// Terminate the body abnormally after a mid-stream failure
    fn abort(&mut self);
}

/// Who renders error responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// The finisher writes the error status and headers with an empty body
    #[default]
    Respond,
    /// Nothing is written; the caller renders the returned error
    Caller,
}

/// Terminal writer of one request
pub struct Finisher<'a, W: ResponseWriter> {
    writer: &'a mut W,
    method: Method,
    mode: ErrorMode,
    server_info: &'a str,
    head_sent: bool,
}

impl<'a, W: ResponseWriter> Finisher<'a, W> {
    pub fn new(writer: &'a mut W, method: Method, mode: ErrorMode, server_info: &'a str) -> Self {
        Self {
            writer,
            method,
            mode,
            server_info,
            head_sent: false,
        }
    }

    /// Send the response head ahead of a streamed body
    pub fn write_head(&mut self, status: StatusCode, headers: &HeaderSet) {
        self.writer.write_head(status, headers);
        self.head_sent = true;
    }

    pub fn writer(&mut self) -> &mut W {
        &mut *self.writer
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Complete the request
    ///
    /// Error statuses (>= 400) resolve to `Err`, carrying `failure` or a generic
    /// status reason. Success statuses resolve to `Ok`; the body is ended here
    /// unless this is a `GET` answered with 200, whose body the streaming stage ends.
    pub fn finish(
        self,
        status: StatusCode,
        mut headers: HeaderSet,
        failure: Option<ErrorKind>,
    ) -> Result<ServeResult, ServeError> {
        headers.insert(SERVER, self.server_info);
        let result = ServeResult::new(status, headers);

        if status.is_client_error() || status.is_server_error() {
            let reason = failure.unwrap_or(ErrorKind::Status(status));
            let written = match self.mode {
                ErrorMode::Caller => self.head_sent,
                ErrorMode::Respond => {
                    if !self.head_sent {
                        self.writer.write_head(status, &result.headers);
                    }
                    if matches!(reason, ErrorKind::StreamFailure { .. }) && self.head_sent {
                        self.writer.abort();
                    } else {
                        self.writer.end();
                    }
                    true
                }
            };
            return Err(ServeError {
                reason,
                response: result,
                written,
            });
        }

        if !self.head_sent {
            self.writer.write_head(status, &result.headers);
        }
        if status != StatusCode::OK || self.method != Method::GET {
            self.writer.end();
        }
        Ok(result)
    }
}

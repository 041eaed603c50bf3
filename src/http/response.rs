//! HTTP response building module
//!
//! Turns a status and [`HeaderSet`] into a hyper response, decoupled from how
//! the body is produced.

use super::headers::HeaderSet;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Response, StatusCode};

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// Body with no content
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body with fixed content
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Build a response from a status, header set and body
pub fn build_response(
    status: StatusCode,
    headers: HeaderSet,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers.into_header_map();
    response
}

/// Build 500 Internal Server Error response
///
/// Used when a request ended without producing a response head.
pub fn build_500_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "text/plain")
        .body(full_body("500 Internal Server Error"))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(empty_body())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

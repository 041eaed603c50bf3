//! Request dispatch module
//!
//! Entry point for HTTP request processing: hands the request to the object
//! server on its own task and turns the written head into a streaming response.

use super::writer::ChannelWriter;
use crate::config::AppState;
use crate::http::{build_500_response, build_response, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::serve::{RequestContext, ServeError, ServeResult};
use http_body_util::{BodyExt, StreamBody};
use hyper::header::{CONTENT_ENCODING, USER_AGENT};
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::ReceiverStream;

/// Body frames buffered between the store and the connection
const BODY_BUFFER: usize = 16;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let ctx = RequestContext::from_parts(req.method(), req.uri(), req.headers());

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.user_agent = ctx.header(&USER_AGENT).map(ToString::to_string);
    entry.container.clone_from(&state.server.config().container);

    let (mut writer, head_rx, body_rx) = ChannelWriter::new(BODY_BUFFER);

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        let outcome = task_state.server.serve(None, &ctx, &mut writer).await;
        if let Err(e) = &outcome {
            log_failure(e);
        }
        if task_state.config.logging.access_log {
            let response = match &outcome {
                Ok(result) => result,
                Err(e) => &e.response,
            };
            record_access(&mut entry, response, writer.bytes_sent(), started);
            logger::log_access(&entry, &task_state.config.logging.access_log_format);
        }
    });

    match head_rx.await {
        Ok((status, headers)) => {
            let body = StreamBody::new(ReceiverStream::new(body_rx)).boxed();
            Ok(build_response(status, headers, body))
        }
        Err(_) => {
            logger::log_error("Request finished without writing a response head");
            Ok(build_500_response())
        }
    }
}

fn record_access(entry: &mut AccessLogEntry, response: &ServeResult, bytes: u64, started: Instant) {
    entry.status = response.status.as_u16();
    entry.body_bytes = bytes;
    entry.content_encoding = response.headers.get(CONTENT_ENCODING).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
}

fn log_failure(err: &ServeError) {
    if err.status().is_server_error() {
        logger::log_error(&err.to_string());
    } else {
        logger::log_debug(&err.to_string());
    }
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

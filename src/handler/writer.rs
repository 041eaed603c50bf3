//! Channel-backed response writer
//!
//! Bridges the serving pipeline to hyper: the head travels over a oneshot
//! channel, body frames over a bounded mpsc channel that backs a `StreamBody`.

use crate::http::HeaderSet;
use crate::serve::ResponseWriter;
use crate::store::{ObjectSink, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use hyper::body::Frame;
use hyper::StatusCode;
use std::io;
use tokio::sync::{mpsc, oneshot};

/// One item of a streamed response body
pub type BodyFrame = Result<Frame<Bytes>, io::Error>;

/// Status and headers sent ahead of the body
pub type ResponseHead = (StatusCode, HeaderSet);

/// [`ResponseWriter`] feeding a hyper response through channels
///
/// One body slot stays reserved for the error frame sent by
/// [`ResponseWriter::abort`], so an abort is delivered even when the buffer is
/// full of unread data.
#[derive(Debug)]
pub struct ChannelWriter {
    head: Option<oneshot::Sender<ResponseHead>>,
    body: Option<mpsc::Sender<BodyFrame>>,
    abort_slot: Option<mpsc::OwnedPermit<BodyFrame>>,
    bytes_sent: u64,
}

impl ChannelWriter {
    /// Create a writer and the receiving ends of its head and body channels
    ///
    /// `buffer` data frames may be queued ahead of the connection.
    pub fn new(
        buffer: usize,
    ) -> (Self, oneshot::Receiver<ResponseHead>, mpsc::Receiver<BodyFrame>) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(buffer.max(1) + 1);
        // Fresh channel with spare capacity, the reservation cannot fail
        let abort_slot = body_tx.clone().try_reserve_owned().ok();
        let writer = Self {
            head: Some(head_tx),
            body: Some(body_tx),
            abort_slot,
            bytes_sent: 0,
        };
        (writer, head_rx, body_rx)
    }

    /// Body bytes accepted by the channel so far
    pub const fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}

#[async_trait]
impl ObjectSink for ChannelWriter {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StoreError> {
        let Some(body) = &self.body else {
            return Err(StoreError::SinkClosed);
        };
        let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        // The receiver is gone once the client disconnects
        let permit = body.reserve().await.map_err(|_| StoreError::SinkClosed)?;
        permit.send(Ok(Frame::data(chunk)));
        self.bytes_sent += len;
        Ok(())
    }
}

impl ResponseWriter for ChannelWriter {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderSet) {
        if let Some(head) = self.head.take() {
            let _ = head.send((status, headers.clone()));
        }
    }

    fn end(&mut self) {
        self.abort_slot = None;
        self.body = None;
    }

    fn abort(&mut self) {
        if let Some(slot) = self.abort_slot.take() {
            slot.send(Err(io::Error::other("object stream failed")));
        }
        self.body = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::ETAG;

    #[tokio::test]
    async fn test_head_and_body_delivery() {
        let (mut writer, head_rx, mut body_rx) = ChannelWriter::new(4);
        let headers = HeaderSet::try_from_pairs([("etag", "\"abc\"")]).unwrap();

        writer.write_head(StatusCode::OK, &headers);
        writer.write_chunk(Bytes::from_static(b"hello ")).await.unwrap();
        writer.write_chunk(Bytes::from_static(b"world")).await.unwrap();
        writer.end();

        let (status, received) = head_rx.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(received.get(ETAG), Some("\"abc\""));
        assert_eq!(writer.bytes_sent(), 11);

        let mut body = Vec::new();
        while let Some(frame) = body_rx.recv().await {
            body.extend_from_slice(&frame.unwrap().into_data().unwrap());
        }
        assert_eq!(body, b"hello world");
    }

    #[tokio::test]
    async fn test_abort_delivered_when_buffer_full() {
        let (mut writer, _head_rx, mut body_rx) = ChannelWriter::new(1);
        writer.write_chunk(Bytes::from_static(b"first")).await.unwrap();
        writer.abort();

        assert!(body_rx.recv().await.unwrap().is_ok());
        assert!(body_rx.recv().await.unwrap().is_err());
        assert!(body_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_end_closes_without_error_frame() {
        let (mut writer, _head_rx, mut body_rx) = ChannelWriter::new(1);
        writer.write_chunk(Bytes::from_static(b"all")).await.unwrap();
        writer.end();
        writer.abort();

        assert!(body_rx.recv().await.unwrap().is_ok());
        assert!(body_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_abort_sends_error_frame() {
        let (mut writer, _head_rx, mut body_rx) = ChannelWriter::new(4);
        writer.write_chunk(Bytes::from_static(b"partial")).await.unwrap();
        writer.abort();
        writer.end();

        assert!(body_rx.recv().await.unwrap().is_ok());
        assert!(body_rx.recv().await.unwrap().is_err());
        assert!(body_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_write_after_end_fails() {
        let (mut writer, _head_rx, _body_rx) = ChannelWriter::new(1);
        writer.end();
        writer.end();
        let err = writer.write_chunk(Bytes::from_static(b"late")).await.unwrap_err();
        assert!(matches!(err, StoreError::SinkClosed));
    }

    #[tokio::test]
    async fn test_disconnected_client_closes_sink() {
        let (mut writer, _head_rx, body_rx) = ChannelWriter::new(1);
        drop(body_rx);
        assert!(writer.write_chunk(Bytes::from_static(b"x")).await.is_err());
        assert_eq!(writer.bytes_sent(), 0);
    }
}

//! Test doubles for the serving path

use super::finish::ResponseWriter;
use crate::http::HeaderSet;
use crate::store::{MemoryStore, ObjectMeta, ObjectSink, ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use hyper::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records everything written to it
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub status: Option<StatusCode>,
    pub headers: HeaderSet,
    pub body: Vec<u8>,
    pub heads_written: usize,
    pub ended: bool,
    pub aborted: bool,
}

#[async_trait]
impl ObjectSink for RecordingWriter {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StoreError> {
        self.body.extend_from_slice(&chunk);
        Ok(())
    }
}

impl ResponseWriter for RecordingWriter {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderSet) {
        self.status = Some(status);
        self.headers = headers.clone();
        self.heads_written += 1;
    }

    fn end(&mut self) {
        self.ended = true;
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

/// Counts metadata lookups and remembers the keys asked for
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    lookups: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.to_string());
        self.inner.properties(container, key).await
    }

    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError> {
        self.inner.stream_object(container, key, sink).await
    }
}

/// Fails to stream one key after its metadata resolved normally
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    failing_key: String,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, failing_key: &str) -> Self {
        Self {
            inner,
            failing_key: failing_key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        self.inner.properties(container, key).await
    }

    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError> {
        if key == self.failing_key {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "backend connection reset",
            )));
        }
        self.inner.stream_object(container, key, sink).await
    }
}

/// Fails metadata lookups for chosen keys with a backend error
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_keys: Vec<String>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing_keys: &[&str]) -> Self {
        Self {
            inner,
            failing_keys: failing_keys.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        if self.failing_keys.iter().any(|k| k == key) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "backend timeout",
            )));
        }
        self.inner.properties(container, key).await
    }

    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError> {
        self.inner.stream_object(container, key, sink).await
    }
}

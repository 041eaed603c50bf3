//! In-memory object store
//!
//! Holds containers of objects in a process-local map. Used by tests and by the
//! `memory` storage backend.

use super::{ObjectMeta, ObjectSink, ObjectStore, StoreError};
use crate::http::cache;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Chunk size used when streaming stored bytes into a sink
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// Map-backed [`ObjectStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, stamping it with the current time
    pub fn put(&self, container: &str, key: &str, data: impl Into<Bytes>) -> ObjectMeta {
        self.put_with_modified(container, key, data, Utc::now())
    }

    /// Store an object with an explicit modification time
    pub fn put_with_modified(
        &self,
        container: &str,
        key: &str,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) -> ObjectMeta {
        let data = data.into();
        let object = StoredObject {
            etag: cache::generate_etag(&data),
            data,
            last_modified,
        };
        let meta = describe(key, &object);

        let mut containers = self
            .containers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        containers
            .entry(container.to_string())
            .or_default()
            .insert(key.to_string(), object);
        meta
    }

    /// Remove an object, returning whether it existed
    pub fn remove(&self, container: &str, key: &str) -> bool {
        let mut containers = self
            .containers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        containers
            .get_mut(container)
            .is_some_and(|objects| objects.remove(key).is_some())
    }

    fn get(&self, container: &str, key: &str) -> Result<StoredObject, StoreError> {
        let containers = self
            .containers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        containers
            .get(container)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(container, key))
    }
}

fn describe(key: &str, object: &StoredObject) -> ObjectMeta {
    ObjectMeta {
        key: key.to_string(),
        size: object.data.len() as u64,
        etag: object.etag.clone(),
        last_modified: object.last_modified,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        self.get(container, key).map(|object| describe(key, &object))
    }

    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError> {
        let object = self.get(container, key)?;
        let mut offset = 0;
        while offset < object.data.len() {
            let end = (offset + CHUNK_SIZE).min(object.data.len());
            sink.write_chunk(object.data.slice(offset..end)).await?;
            offset = end;
        }
        Ok(object.data.len() as u64)
    }
}

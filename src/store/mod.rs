//! Object store module
//!
//! The serving core never touches bytes at rest directly. Every lookup and every
//! body goes through [`ObjectStore`], which maps a container name and object key
//! to metadata or a byte stream.

pub mod directory;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

/// Metadata of a single stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object key inside its container
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Opaque validator, sent verbatim as the `ETag` header
    pub etag: String,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
}

/// Errors reported by an object store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object `{key}` not found in container `{container}`")]
    NotFound { container: String, key: String },

    #[error("invalid object key `{0}`")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response sink closed before the object was fully written")]
    SinkClosed,
}

impl StoreError {
    pub fn not_found(container: &str, key: &str) -> Self {
        Self::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    }
}

/// Destination for streamed object bytes
///
/// Implementations may apply backpressure by suspending in `write_chunk`.
#[async_trait]
pub trait ObjectSink: Send {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StoreError>;
}

/// Keyed blob storage consumed by the server
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch metadata for `key` in `container`.
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Stream the bytes of `key` into `sink`, returning the number of bytes written.
    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
impl ObjectSink for Vec<u8> {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StoreError> {
        self.extend_from_slice(&chunk);
        Ok(())
    }
}

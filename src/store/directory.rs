//! Directory-backed object store
//!
//! Each container is a sub-directory of a root directory, and each key is a
//! relative file path inside it. Keys that would escape the container are rejected.

use super::{ObjectMeta, ObjectSink, ObjectStore, StoreError};
use crate::logger;
use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Read buffer size used when streaming files
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Filesystem-backed [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map container and key to a file path, refusing anything but plain
    /// relative segments
    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StoreError> {
        if !is_plain_relative(container) || container.contains('/') {
            return Err(StoreError::InvalidKey(container.to_string()));
        }
        if !is_plain_relative(key) {
            logger::log_warning(&format!("Rejected object key outside container: {key}"));
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(container).join(key))
    }
}

fn is_plain_relative(segment: &str) -> bool {
    !segment.is_empty()
        && Path::new(segment)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Derive a validator from size and modification time
fn file_etag(size: u64, modified: &DateTime<Utc>) -> String {
    format!("\"{size:x}-{:x}\"", modified.timestamp_millis())
}

#[async_trait]
impl ObjectStore for DirectoryStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        let path = self.object_path(container, key)?;
        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StoreError::not_found(container, key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(container, key))
            }
            Err(e) => return Err(e.into()),
        };

        let last_modified: DateTime<Utc> = metadata.modified()?.into();
        Ok(ObjectMeta {
            key: key.to_string(),
            size: metadata.len(),
            etag: file_etag(metadata.len(), &last_modified),
            last_modified,
        })
    }

    async fn stream_object(
        &self,
        container: &str,
        key: &str,
        sink: &mut dyn ObjectSink,
    ) -> Result<u64, StoreError> {
        let path = self.object_path(container, key)?;
        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(container, key))
            }
            Err(e) => return Err(e.into()),
        };

        let mut written = 0u64;
        loop {
            let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
            let n = file.read_buf(&mut buf).await?;
            if n == 0 {
                break;
            }
            written += n as u64;
            sink.write_chunk(buf.freeze()).await?;
        }
        Ok(written)
    }
}

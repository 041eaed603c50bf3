// Application state module
// Everything a connection needs, shared read-only across tasks

use std::sync::Arc;

use super::types::{Config, StorageBackend};
use crate::serve::{LogObserver, StaticServer};
use crate::store::{DirectoryStore, MemoryStore, ObjectStore};

/// Application state
pub struct AppState {
    pub config: Config,
    pub server: StaticServer,
}

impl AppState {
    /// Build state from configuration, constructing the configured store
    pub fn new(config: &Config) -> Result<Self, String> {
        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Directory => {
                let root = config
                    .storage
                    .root
                    .as_deref()
                    .ok_or("storage.root is required for the directory backend")?;
                Arc::new(DirectoryStore::new(root))
            }
        };
        Self::with_store(config, store)
    }

    /// Build state around an existing store
    pub fn with_store(config: &Config, store: Arc<dyn ObjectStore>) -> Result<Self, String> {
        let serve_config = config.serve_config()?;
        let server = StaticServer::new(store, serve_config).with_observer(Arc::new(LogObserver));
        Ok(Self {
            config: config.clone(),
            server,
        })
    }
}

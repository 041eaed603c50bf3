//! Static HTTP content server backed by an object store
//!
//! Request paths are resolved against a container of keyed objects with
//! directory index fallback, cache validation and precompressed variants.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod serve;
pub mod server;
pub mod store;

/// Crate version, reported in the default `Server` header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{AppState, Config, ServeConfig};
pub use serve::{ErrorMode, RequestContext, ServeError, ServeResult, StaticServer};
pub use store::{DirectoryStore, MemoryStore, ObjectMeta, ObjectStore};

// Configuration types module
// Defines all configuration-related data structures as read from file/environment

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub storage: StorageConfig,
    pub serve: ServeSection,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `blobserve=debug`
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Object store backend selection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local map, starts empty
    Memory,
    /// One sub-directory per container under `root`
    Directory,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub root: Option<String>,
}

impl StorageConfig {
    pub fn describe(&self) -> String {
        match (self.backend, &self.root) {
            (StorageBackend::Memory, _) => "memory".to_string(),
            (StorageBackend::Directory, Some(root)) => format!("directory ({root})"),
            (StorageBackend::Directory, None) => "directory (unset)".to_string(),
        }
    }
}

/// `cache` accepts `false` to disable `Cache-Control`, `true` for the default,
/// or a max-age in seconds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum CacheSetting {
    Enabled(bool),
    MaxAge(u32),
}

/// `gzip` accepts a boolean or a regular expression matched against the
/// response content type
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum GzipSetting {
    Enabled(bool),
    Pattern(String),
}

/// Serving configuration as written in the config file
#[derive(Debug, Deserialize, Clone)]
pub struct ServeSection {
    pub container: String,
    pub cache: CacheSetting,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub gzip: GzipSetting,
    #[serde(default)]
    pub server_info: Option<String>,
}

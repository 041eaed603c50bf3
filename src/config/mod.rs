// Configuration module entry point
// Loads file/environment configuration and builds the immutable serving settings

mod serve;
mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use serve::{default_server_info, GzipPolicy, ServeConfig, DEFAULT_CONTAINER};
pub use state::AppState;
pub use types::{
    CacheSetting, Config, GzipSetting, LoggingConfig, PerformanceConfig, ServeSection,
    ServerConfig, StorageBackend, StorageConfig,
};

/// Environment variable prefix, e.g. `BLOBSERVE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "BLOBSERVE";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("storage.backend", "directory")?
            .set_default("storage.root", "storage")?
            .set_default("serve.container", DEFAULT_CONTAINER)?
            .set_default("serve.cache", 3600)?
            .set_default("serve.gzip", false)?
            .build()?;

        settings.try_deserialize()
    }

    /// Load from the default `config` file name
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Validate the `serve` section into the settings used by the server
    pub fn serve_config(&self) -> Result<ServeConfig, String> {
        ServeConfig::try_from(&self.serve)
    }
}

// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
    TemplatesConfig,
};

/// Default config file looked up next to the working directory (any extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default file, environment and `PORT`
    pub fn load() -> Result<Self, config::ConfigError> {
        let port = std::env::var("PORT").ok();
        Self::load_with(DEFAULT_CONFIG_PATH, port.as_deref())
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// `port` is the raw `PORT` value; unset or empty keeps the configured port.
    pub fn load_with(config_path: &str, port: Option<&str>) -> Result<Self, config::ConfigError> {
        let port = port.map(str::trim).filter(|p| !p.is_empty());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("IMGHOST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("storage.root", "images")?
            .set_default("storage.id_scheme", "random")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 30)?
            .set_default("http.server_name", "imghost")?
            .set_default("http.max_upload_size", 10_485_760)? // 10MB
            .set_override_option("server.port", port)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

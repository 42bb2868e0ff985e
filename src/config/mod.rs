// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::net::{IpAddr, SocketAddr};

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, MediaConfig, StorageConfig};

/// Plain environment variable that selects the listening port
const PORT_ENV: &str = "PORT";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the optional config
    /// file, `MEDIAGATE_*` environment variables (`__` separates nested keys),
    /// and finally `PORT`.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let port = parse_port(std::env::var(PORT_ENV).ok())?;
        Self::load_layered(config_path, None, port)
    }

    /// Layered load with an explicit environment (`None` reads the process env)
    fn load_layered(
        config_path: &str,
        env: Option<config::Map<String, String>>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIAGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("server.port", port.map(i64::from))?
            .build()?;

        settings.try_deserialize()
    }

    /// Configuration built from defaults only, ignoring files and environment
    #[cfg(test)]
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.listen_backlog", 128)?
            .set_default("performance.shutdown_grace_period", 10)?
            .set_default("http.server_name", "mediagate/0.1")?
            .set_default("http.enable_cors", true)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("storage.processed_dir", "processed")?
            .set_default("storage.isolate_jobs", false)?
            .set_default("storage.cleanup", false)?
            .set_default("media.tool", "ffmpeg")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|e| format!("Invalid host '{}': {e}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

/// Parse the raw `PORT` value; unset means no override
fn parse_port(raw: Option<String>) -> Result<Option<u16>, ConfigError> {
    raw.map(|raw| {
        raw.trim().parse::<u16>().map_err(|e| {
            ConfigError::Message(format!("Invalid {PORT_ENV} value '{raw}': {e}"))
        })
    })
    .transpose()
}

// Configuration module entry point
// Loads layered configuration: file, environment, defaults

mod types;

use std::net::SocketAddr;

use crate::error::{Error, Result};

// Re-export public types
pub use types::{
    Config, EngineConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    DEFAULT_HOST, DEFAULT_MAX_BODY_SIZE, DEFAULT_POOL_CAPACITY, DEFAULT_PORT,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "sonata";

impl Config {
    /// Load configuration from the default `sonata.toml` (optional) and `SONATA_*` env vars
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Nested keys are read from the environment with a double underscore,
    /// e.g. `SONATA_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SONATA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.color", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 33_554_432)? // 32MB
            .set_default("engine.pool", true)?
            .set_default("engine.pool_capacity", 1024)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}:{} ({e})", self.server.host, self.server.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_listen_port() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8111);
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.port(), 8111);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load_from("/nonexistent/sonata-config").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_from_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("sonata.toml")).unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[engine]\npool = false\npool_capacity = 8"
        )
        .unwrap();
        let path = dir.path().join("sonata");
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, DEFAULT_HOST);
        assert!(!cfg.engine.pool);
        assert_eq!(cfg.engine.pool_capacity, 8);
    }

    #[test]
    fn test_invalid_address() {
        let mut cfg = Config::default();
        cfg.server.host = "not an address".to_string();
        assert!(matches!(cfg.get_socket_addr(), Err(Error::InvalidAddress(_))));
    }
}

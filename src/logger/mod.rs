//! Logger module
//!
//! Provides logging utilities for the framework including:
//! - Leveled framework logging (debug/info/warn/error)
//! - Server lifecycle logging
//! - Access log formatting for the logging middleware
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{common_formatter, default_formatter, json_formatter, LogFormatterParams};
pub use writer::{LogWriter, MemoryLog};

use crate::config::{Config, LoggingConfig};
use chrono::Local;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log level, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Leveled logger owned by an `Engine`
pub struct Logger {
    level: Level,
    writer: LogWriter,
}

impl Logger {
    pub const fn new(level: Level, writer: LogWriter) -> Self {
        Self { level, writer }
    }

    /// Build a logger from the `[logging]` section
    ///
    /// An unknown level falls back to `info`.
    pub fn from_config(config: &LoggingConfig) -> std::io::Result<Self> {
        let writer = LogWriter::new(
            config.access_log_file.as_deref(),
            config.error_log_file.as_deref(),
        )?;
        let level = config.level.parse().unwrap_or(Level::Info);
        Ok(Self::new(level, writer))
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub fn debug(&self, message: &str) {
        self.print(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.print(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.print(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.print(Level::Error, message);
    }

    fn print(&self, level: Level, message: &str) {
        if level < self.level {
            return;
        }
        let line = format!(
            "{} [{level}] {message}",
            Local::now().format("%Y/%m/%d - %H:%M:%S")
        );
        match level {
            Level::Warn | Level::Error => self.writer.write_error(&line),
            Level::Debug | Level::Info => self.writer.write_info(&line),
        }
    }

    /// Write an already formatted access log line, independent of the level
    pub fn access(&self, line: &str) {
        self.writer.write_access(line);
    }

    pub fn log_server_start(&self, addr: &SocketAddr, config: &Config) {
        self.info("======================================");
        self.info("sonata server started");
        self.info(&format!("Listening on: http://{addr}"));
        self.info(&format!("Log level: {}", config.logging.level));
        if let Some(workers) = config.server.workers {
            self.info(&format!("Worker threads: {workers}"));
        }
        if let Some(ref path) = config.logging.access_log_file {
            self.info(&format!("Access log: {path}"));
        }
        if let Some(ref path) = config.logging.error_log_file {
            self.info(&format!("Error log: {path}"));
        }
        self.info(&format!(
            "Context pool: {}",
            if config.engine.pool { "enabled" } else { "disabled" }
        ));
        self.info("======================================");
    }

    pub fn log_connection_accepted(&self, peer_addr: &SocketAddr) {
        self.debug(&format!("[Connection] Accepted from: {peer_addr}"));
    }

    pub fn log_connection_error(&self, err: &impl fmt::Debug) {
        self.error(&format!("Failed to serve connection: {err:?}"));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Level::Info, LogWriter::stdio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filtering() {
        let (writer, log) = LogWriter::memory();
        let logger = Logger::new(Level::Info, writer);
        logger.debug("hidden");
        logger.info("shown");
        logger.error("failed");
        let contents = log.contents();
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("[INFO] shown"));
        assert!(contents.contains("[ERROR] failed"));
    }

    #[test]
    fn test_access_ignores_level() {
        let (writer, log) = LogWriter::memory();
        let logger = Logger::new(Level::Error, writer);
        logger.access("[sonata] line");
        assert_eq!(log.contents(), "[sonata] line\n");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("DEBUG".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert!("loud".parse::<Level>().is_err());
        assert!(Level::Debug < Level::Error);
    }
}

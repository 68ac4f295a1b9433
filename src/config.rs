//! Configuration for kvcli
//!
//! Centralized configuration with sensible defaults. Values can come from
//! the builder, from a TOML file, or both (file first, then overrides).
//!
//! ## File Format
//! ```toml
//! [connection]
//! host = "127.0.0.1"
//! port = 6379
//! connect_timeout_ms = 3000
//! read_timeout_ms = 5000
//! write_timeout_ms = 5000
//!
//! [protocol]
//! frame_mode = "resp"        # or "crlf-suffix"
//! chunk_size = 4096
//! max_response_size = 67108864
//!
//! [logging]
//! level = "warn"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 6379;

/// Default read chunk size (bytes per `read` call)
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default upper bound on a single reply (64 MB)
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

/// Main configuration for a kvcli session
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// How the end of a reply is detected
    pub frame_mode: FrameMode,

    /// Bytes requested per read from the socket
    pub chunk_size: usize,

    /// Largest reply accepted before giving up
    pub max_response_size: usize,

    // -------------------------------------------------------------------------
    // Logging Configuration
    // -------------------------------------------------------------------------
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

/// Reply termination rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameMode {
    /// Scan the reply by RESP type and stop after one complete value
    #[default]
    Resp,

    /// Stop as soon as the buffered bytes end with CRLF.
    ///
    /// Compatible with older clients, but stops early when a multi-element
    /// reply arrives split at an inner CRLF.
    CrlfSuffix,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 3000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            frame_mode: FrameMode::Resp,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Turn this config back into a builder, e.g. to apply CLI overrides
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder { config: self }
    }

    /// Load a config from a TOML file, filling gaps with defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ClientError::Config(msg) => {
                ClientError::Config(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse a config from TOML text, filling gaps with defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| ClientError::Config(e.to_string()))?;
        let config = file.apply(Config::builder()).build();
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the client misbehave
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ClientError::Config("port must not be 0".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk_size must be positive".to_string()));
        }
        if self.max_response_size == 0 {
            return Err(ClientError::Config(
                "max_response_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` label, used for connecting and for the prompt
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

/// 0 means "no timeout"
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the reply termination rule
    pub fn frame_mode(mut self, mode: FrameMode) -> Self {
        self.config.frame_mode = mode;
        self
    }

    /// Set the read chunk size (in bytes)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the maximum reply size (in bytes)
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    /// Set the default log filter
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// TOML File Layout
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    connection: ConnectionSection,
    #[serde(default)]
    protocol: ProtocolSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionSection {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_ms: Option<u64>,
    read_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProtocolSection {
    frame_mode: Option<FrameMode>,
    chunk_size: Option<usize>,
    max_response_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    level: Option<String>,
}

impl FileConfig {
    /// Apply every value present in the file on top of `builder`
    fn apply(self, mut builder: ConfigBuilder) -> ConfigBuilder {
        let ConnectionSection {
            host,
            port,
            connect_timeout_ms,
            read_timeout_ms,
            write_timeout_ms,
        } = self.connection;

        if let Some(host) = host {
            builder = builder.host(host);
        }
        if let Some(port) = port {
            builder = builder.port(port);
        }
        if let Some(ms) = connect_timeout_ms {
            builder = builder.connect_timeout_ms(ms);
        }
        if let Some(ms) = read_timeout_ms {
            builder = builder.read_timeout_ms(ms);
        }
        if let Some(ms) = write_timeout_ms {
            builder = builder.write_timeout_ms(ms);
        }
        if let Some(mode) = self.protocol.frame_mode {
            builder = builder.frame_mode(mode);
        }
        if let Some(size) = self.protocol.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(size) = self.protocol.max_response_size {
            builder = builder.max_response_size(size);
        }
        if let Some(level) = self.logging.level {
            builder = builder.log_level(level);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.addr(), "127.0.0.1:6379");
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.frame_mode, FrameMode::Resp);
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = Config::builder().read_timeout_ms(0).build();
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [connection]
            port = 7000

            [protocol]
            frame_mode = "crlf-suffix"
            "#,
        )
        .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, 7000);
        assert_eq!(config.frame_mode, FrameMode::CrlfSuffix);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Config::from_toml_str("[connection]\nhots = \"x\"\n");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = Config::from_toml_str("[protocol]\nchunk_size = 0\n");
        assert!(result.unwrap_err().to_string().contains("chunk_size"));
    }
}

//! Service configuration.
//!
//! Read from an optional TOML file; every section and key may be omitted.
//!
//! ```toml
//! [server]
//! listen-addr = "0.0.0.0:5000"
//!
//! [documents]
//! upload-dir = "uploads"
//!
//! [history]
//! limit = 10
//!
//! [logging]
//! filter = "info,tower_http=debug"
//! format = "json"
//! ```

use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{runtime::handle::RuntimeConfig, types::DEFAULT_HISTORY_LIMIT};

/// Configuration could not be loaded or is out of range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File given.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`Config`].
    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        /// File given.
        path: PathBuf,
        /// TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// `server.listen-addr` is not a socket address.
    #[error("invalid listen address {addr:?}: {reason}")]
    ListenAddr {
        /// Value given.
        addr: String,
        /// Parser message.
        reason: String,
    },
    /// `history.limit` is zero.
    #[error("history limit must be at least 1")]
    HistoryLimit,
}

/// Whole service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// `[server]`
    pub server: ServerConfig,
    /// `[documents]`
    pub documents: DocumentsConfig,
    /// `[history]`
    pub history: HistoryConfig,
    /// `[runtime]`
    pub runtime: RuntimeSection,
    /// `[logging]`
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// `host:port` to bind.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Uploaded-document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DocumentsConfig {
    /// Directory purged by complete resets.
    pub upload_dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Reset history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HistoryConfig {
    /// Records kept before the oldest is evicted.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Store task channel sizes; see [`RuntimeConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RuntimeSection {
    /// Pending commands before senders wait.
    pub command_queue_bound: usize,
    /// Buffered events per subscriber.
    pub event_capacity: usize,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        let rt = RuntimeConfig::default();
        Self {
            command_queue_bound: rt.command_queue_bound,
            event_capacity: rt.event_capacity,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Formatter used by [`crate::telemetry::init`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, for terminals.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl Config {
    /// Loads `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses TOML text.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// `server.listen-addr` as a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::ListenAddr {
                addr: self.server.listen_addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Rejects values the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.history.limit == 0 {
            return Err(ConfigError::HistoryLimit);
        }
        Ok(())
    }

    /// Channel sizes for [`crate::runtime::handle::spawn_itinerary_store`].
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            command_queue_bound: self.runtime.command_queue_bound,
            event_capacity: self.runtime.event_capacity,
        }
    }
}

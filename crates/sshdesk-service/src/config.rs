//! Service configuration.
//!
//! Read from the `[service]` table of a TOML file; every field has a
//! default, and other tables in the same file are ignored so one file can
//! configure both processes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sshdesk_protocol::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT};

/// Default cap on simultaneously served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Service configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Address to bind, `host:port`.
    pub listen_addr: String,
    /// Connections served at once; `0` removes the cap.
    pub max_connections: usize,
    /// Longest request line accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    service: ServiceConfig,
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ServiceConfig {
    /// Parse the `[service]` table out of TOML `content`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.service.validate()?;
        Ok(file.service)
    }

    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Check value bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_addr must not be empty".to_string()));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid("max_frame_bytes must be > 0".to_string()));
        }
        Ok(())
    }
}

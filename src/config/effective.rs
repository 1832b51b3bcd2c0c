//! Effective client configuration with provenance
//!
//! Records the merged settings together with the layers that produced
//! them, so `sshdesk config` can show where each value came from.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::client::ClientConfig;

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this layer
    pub origin: ConfigOrigin,

    /// File path (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Resolved client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    pub addr: String,
    pub dial_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub retries: u32,
}

impl ClientSettings {
    /// Convert into a transport configuration
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            addr: self.addr.clone(),
            dial_timeout: Duration::from_millis(self.dial_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            retries: self.retries,
            ..ClientConfig::default()
        }
        .normalized()
    }
}

/// Effective configuration with the layers it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// The merged settings
    pub client: ClientSettings,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl EffectiveConfig {
    /// Resolve settings from the built-in defaults, an optional config file
    /// and CLI overrides (a JSON object shaped like `{"client": {...}}`).
    pub fn build(file: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = file {
            layers.push(Self::load_toml_file(path)?);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_path_buf()),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let mut merged = merge_layers(layers);
        let client_value = merged
            .get_mut("client")
            .map(Value::take)
            .unwrap_or(Value::Null);
        let client: ClientSettings = serde_json::from_value(client_value)
            .map_err(|e| ConfigError::Parse(format!("[client]: {}", e)))?;
        Self::validate(&client)?;

        Ok(Self { client, sources })
    }

    /// The transport configuration these settings describe
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_client_config()
    }

    /// Pretty JSON for display
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;

        // Only the [client] table belongs to this layer.
        let client = toml_value
            .get("client")
            .cloned()
            .map(Self::toml_to_json)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(serde_json::json!({ "client": client }))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    fn validate(client: &ClientSettings) -> Result<(), ConfigError> {
        if client.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("addr must not be empty".to_string()));
        }
        // Timeouts above an hour are almost certainly a seconds/ms mix-up.
        for (name, value) in [
            ("dial_timeout_ms", client.dial_timeout_ms),
            ("read_timeout_ms", client.read_timeout_ms),
            ("write_timeout_ms", client.write_timeout_ms),
        ] {
            if value > 3_600_000 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at most 3600000, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::client::config::{
    DEFAULT_DIAL_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_RETRIES, DEFAULT_WRITE_TIMEOUT,
};
use crate::client::ClientConfig;

/// Built-in default client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Service address (default: 127.0.0.1:8089)
    pub addr: String,

    /// Dial timeout in milliseconds (default: 2000)
    pub dial_timeout_ms: u64,

    /// Read timeout in milliseconds (default: 3000)
    pub read_timeout_ms: u64,

    /// Write timeout in milliseconds (default: 3000)
    pub write_timeout_ms: u64,

    /// Attempts per call (default: 3)
    pub retries: u32,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            addr: ClientConfig::default().addr,
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT.as_millis() as u64,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT.as_millis() as u64,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to a layer for merging, nested under `client`
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "client": {
                "addr": self.addr,
                "dial_timeout_ms": self.dial_timeout_ms,
                "read_timeout_ms": self.read_timeout_ms,
                "write_timeout_ms": self.write_timeout_ms,
                "retries": self.retries,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_client_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.addr, "127.0.0.1:8089");
        assert_eq!(defaults.dial_timeout_ms, 2000);
        assert_eq!(defaults.read_timeout_ms, 3000);
        assert_eq!(defaults.write_timeout_ms, 3000);
        assert_eq!(defaults.retries, 3);
    }

    #[test]
    fn test_to_value_nests_under_client() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["client"]["retries"], 3);
        assert_eq!(value["client"]["addr"], "127.0.0.1:8089");
    }
}

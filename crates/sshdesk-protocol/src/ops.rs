//! Request types and their payloads.

use serde::{Deserialize, Serialize};

/// Known request type names.
pub mod types {
    pub const PING: &str = "ping";
    pub const LIST_CONNECTIONS: &str = "list_connections";
}

/// Reply payload for `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

impl PingResponse {
    pub fn pong() -> Self {
        Self {
            message: "pong".to_string(),
        }
    }
}

/// Description of a remote host the front end wants to reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(rename = "keyPath", default, skip_serializing_if = "String::is_empty")]
    pub key_path: String,
}

/// State of a managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// One entry of a connection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: String,
    pub state: ConnectionState,
}

/// Reply payload for `list_connections`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConnectionsResponse {
    pub connections: Vec<ConnectionInfo>,
}

//! sshdesk client library
//!
//! Talks to the sshdesk backend service over line-delimited JSON: one
//! request and one response per TCP connection, with bounded retries and
//! per-attempt deadlines.

pub mod client;
pub mod config;
pub mod logging;

pub use client::{ApiClient, CancelToken, ClientConfig, ClientError, TcpTransport, Transport, TransportError};
pub use config::{ClientSettings, ConfigError, EffectiveConfig};
pub use sshdesk_protocol::{Message, Response};

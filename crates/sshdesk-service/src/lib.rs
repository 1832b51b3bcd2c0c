//! sshdesk backend service
//!
//! Accepts TCP connections from the front end, reads one JSON request per
//! line, routes it through a [`Handler`] and writes one JSON response per
//! line back on the same connection.
//!
//! The crate is usable as a binary (`sshdesk-service`) or in-process, which
//! is how the integration tests drive it.

pub mod config;
pub mod connection;
pub mod handler;
pub mod handlers;
pub mod server;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use connection::{serve_connection, ConnectionSummary};
pub use handler::{handler_fn, Handler, HandlerError, Router};
pub use handlers::{ConnectionSource, EmptyConnections, StaticConnections};
pub use server::{start, Server, ServerError, ShutdownHandle};

//! Built-in request handlers.
//!
//! Each request type has its own module; [`crate::Router::with_defaults`]
//! wires them up.

pub mod list_connections;
pub mod ping;

pub use list_connections::{
    ConnectionSource, EmptyConnections, ListConnectionsHandler, StaticConnections,
};
pub use ping::PingHandler;

//! `list_connections` handler.
//!
//! The service does not own SSH sessions itself; it reports whatever the
//! connection manager behind [`ConnectionSource`] knows about.

use std::sync::Arc;

use sshdesk_protocol::ops::{ConnectionInfo, ListConnectionsResponse};
use sshdesk_protocol::{Message, Response};

use crate::handler::{Handler, HandlerError};

/// Supplies the current connection table.
pub trait ConnectionSource: Send + Sync {
    fn connections(&self) -> Result<Vec<ConnectionInfo>, HandlerError>;
}

/// A source with no connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyConnections;

impl ConnectionSource for EmptyConnections {
    fn connections(&self) -> Result<Vec<ConnectionInfo>, HandlerError> {
        Ok(Vec::new())
    }
}

/// A fixed connection table.
#[derive(Debug, Clone, Default)]
pub struct StaticConnections {
    entries: Vec<ConnectionInfo>,
}

impl StaticConnections {
    pub fn new(entries: Vec<ConnectionInfo>) -> Self {
        Self { entries }
    }
}

impl ConnectionSource for StaticConnections {
    fn connections(&self) -> Result<Vec<ConnectionInfo>, HandlerError> {
        Ok(self.entries.clone())
    }
}

/// Answers `list_connections` with `{"connections":[...]}`.
#[derive(Clone)]
pub struct ListConnectionsHandler {
    source: Arc<dyn ConnectionSource>,
}

impl ListConnectionsHandler {
    pub fn new(source: Arc<dyn ConnectionSource>) -> Self {
        Self { source }
    }
}

impl Default for ListConnectionsHandler {
    fn default() -> Self {
        Self::new(Arc::new(EmptyConnections))
    }
}

impl Handler for ListConnectionsHandler {
    fn handle(&self, _message: &Message) -> Result<Response, HandlerError> {
        let listing = ListConnectionsResponse {
            connections: self.source.connections()?,
        };
        Ok(Response::success_with(&listing)?)
    }
}

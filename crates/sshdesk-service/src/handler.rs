//! Request routing.
//!
//! A [`Handler`] turns one decoded [`Message`] into one [`Response`]. The
//! [`Router`] is itself a handler that picks a registered handler by
//! request type, so the connection loop never changes when types are added.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sshdesk_protocol::ops::types;
use sshdesk_protocol::{CodecError, Message, Response};

use crate::handlers::{ListConnectionsHandler, PingHandler};

/// Handles one request type.
///
/// Handlers are shared by every connection worker and may be called from
/// many threads at once.
pub trait Handler: Send + Sync {
    /// Produce the response for `message`.
    ///
    /// A well-formed failure (bad payload, unknown id, ...) should be
    /// returned as `Ok` with a failure [`Response`]. `Err` means the handler
    /// itself broke and is reported to the client as a 500.
    fn handle(&self, message: &Message) -> Result<Response, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Message) -> Result<Response, HandlerError> + Send + Sync,
{
    fn handle(&self, message: &Message) -> Result<Response, HandlerError> {
        self(message)
    }
}

/// Adapt a closure into a [`Handler`], fixing its signature for inference.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Message) -> Result<Response, HandlerError> + Send + Sync,
{
    f
}

/// Handler failure, reported to the client with code 500.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Registry of handlers keyed by request type.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl Router {
    /// An empty router; every request is answered with 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// A router with the built-in `ping` and `list_connections` handlers.
    pub fn with_defaults() -> Self {
        Self::new()
            .route(types::PING, PingHandler)
            .route(types::LIST_CONNECTIONS, ListConnectionsHandler::default())
    }

    /// Register `handler` for `kind`, replacing any previous registration.
    pub fn route(mut self, kind: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.insert(kind, Arc::new(handler));
        self
    }

    /// Register a shared handler, returning the one it replaced.
    pub fn insert(
        &mut self,
        kind: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Option<Arc<dyn Handler>> {
        self.routes.insert(kind.into(), handler)
    }

    /// Registered request types, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Handler for Router {
    fn handle(&self, message: &Message) -> Result<Response, HandlerError> {
        match self.routes.get(message.kind()) {
            Some(handler) => handler.handle(message),
            None => Ok(Response::unknown_type(message.kind())),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sshdesk_protocol::codes;

    #[test]
    fn test_defaults_registered() {
        let router = Router::with_defaults();
        assert_eq!(router.kinds(), vec!["list_connections", "ping"]);
    }

    #[test]
    fn test_ping_routed() {
        let response = Router::with_defaults().handle(&Message::new("ping")).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data, Some(json!({"message": "pong"})));
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let response = Router::with_defaults().handle(&Message::new("bogus")).unwrap();
        assert_eq!(response.code, codes::UNKNOWN_TYPE);
        assert!(!response.ok);
        assert_eq!(response.message.as_deref(), Some("unknown type: bogus"));
    }

    #[test]
    fn test_closure_handler_and_replacement() {
        let router = Router::with_defaults()
            .route("ping", handler_fn(|_| Ok(Response::success(json!("custom")))))
            .route("fail", handler_fn(|_| Err(HandlerError::failed("backend unavailable"))));

        let response = router.handle(&Message::new("ping")).unwrap();
        assert_eq!(response.data, Some(json!("custom")));

        let err = router.handle(&Message::new("fail")).unwrap_err();
        assert_eq!(err.to_string(), "backend unavailable");
    }

    #[test]
    fn test_empty_router_answers_everything_with_404() {
        let router = Router::new();
        assert!(router.kinds().is_empty());
        let response = router.handle(&Message::new("ping")).unwrap();
        assert_eq!(response.code, codes::UNKNOWN_TYPE);
    }
}

//! `ping` handler.
//!
//! Connectivity check used by the front end before anything else.

use sshdesk_protocol::ops::PingResponse;
use sshdesk_protocol::{Message, Response};

use crate::handler::{Handler, HandlerError};

/// Answers every `ping` with `{"message":"pong"}`. Any payload is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, _message: &Message) -> Result<Response, HandlerError> {
        Ok(Response::success_with(&PingResponse::pong())?)
    }
}

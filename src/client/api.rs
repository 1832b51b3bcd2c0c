//! Request/response client with retry discipline.

use std::sync::Arc;
use std::time::Instant;

use sshdesk_protocol::codes;
use sshdesk_protocol::ops::{types, ListConnectionsResponse};
use sshdesk_protocol::{decode_line, encode_line, CodecError, Message, Response};
use tracing::{debug, info};

use super::backoff::backoff;
use super::cancel::CancelToken;
use super::config::ClientConfig;
use super::transport::{TcpTransport, Transport, TransportError};

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to encode request: {0}")]
    Encode(#[source] CodecError),

    #[error("failed to decode response: {0}")]
    Decode(#[source] CodecError),

    #[error("request failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("request cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error("request rejected ({} {code}): {message}", codes::describe(*code))]
    Rejected { code: i32, message: String },
}

impl ClientError {
    /// True when a later call could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Exhausted { .. })
    }

    /// Process exit code for CLI front ends.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Rejected { .. } => 1,
            ClientError::Exhausted { .. } => 20,
            ClientError::Encode(_) | ClientError::Decode(_) => 30,
            ClientError::Cancelled { .. } => 130,
        }
    }
}

/// Client for the sshdesk service.
///
/// Every call opens a fresh connection per attempt; nothing is pooled and
/// concurrent calls share no state.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Create a TCP client. Defaults are applied to unset config values.
    pub fn new(config: ClientConfig) -> Self {
        let config = config.normalized();
        let transport = Arc::new(TcpTransport::from_config(&config));
        Self { config, transport }
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: config.normalized(),
            transport,
        }
    }

    /// The effective configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `message` and return the service's response.
    pub fn send(&self, message: &Message) -> Result<Response, ClientError> {
        self.send_with_cancel(message, &CancelToken::new())
    }

    /// Like [`ApiClient::send`], giving up early once `cancel` fires.
    ///
    /// Dial, write and read failures are retried up to `retries` attempts
    /// with exponential backoff. Encoding the request and decoding the reply
    /// are not retried: a failure there will not go away on its own.
    pub fn send_with_cancel(
        &self,
        message: &Message,
        cancel: &CancelToken,
    ) -> Result<Response, ClientError> {
        let started = Instant::now();
        let frame = encode_line(message).map_err(ClientError::Encode)?;
        let retries = self.config.retries;

        let mut attempts = 0;
        let mut last_error = None;
        let mut reply = None;
        for attempt in 0..retries {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled { attempts });
            }
            attempts = attempt + 1;

            match self.transport.attempt(&frame) {
                Ok(bytes) => {
                    reply = Some(bytes);
                    break;
                }
                Err(e) => {
                    debug!(
                        attempt = attempts,
                        retries,
                        msg_type = message.kind(),
                        error = %e,
                        "request attempt failed"
                    );
                    last_error = Some(e);
                    if attempts < retries {
                        cancel.sleep(backoff(attempt));
                    }
                }
            }
        }

        let bytes = match (reply, last_error) {
            (Some(bytes), _) => bytes,
            (None, Some(source)) => return Err(ClientError::Exhausted { attempts, source }),
            (None, None) => return Err(ClientError::Cancelled { attempts }),
        };

        let response: Response = decode_line(&bytes).map_err(ClientError::Decode)?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if response.ok {
            info!(
                code = response.code,
                elapsed_ms,
                msg_type = message.kind(),
                attempts,
                "api ok"
            );
        } else {
            info!(
                code = response.code,
                detail = response.message.as_deref().unwrap_or(""),
                elapsed_ms,
                msg_type = message.kind(),
                attempts,
                "api err"
            );
        }

        Ok(response)
    }

    /// Connectivity check.
    pub fn ping(&self) -> Result<Response, ClientError> {
        self.send(&Message::new(types::PING))
    }

    /// Fetch the service's connection table.
    pub fn list_connections(&self) -> Result<ListConnectionsResponse, ClientError> {
        let response = self.send(&Message::new(types::LIST_CONNECTIONS))?;
        if !response.is_success() {
            return Err(ClientError::Rejected {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }
        response.decode_data().map_err(ClientError::Decode)
    }
}

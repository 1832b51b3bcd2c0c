//! Client transport configuration.

use std::time::Duration;

use sshdesk_protocol::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT};

/// Default time allowed to establish a connection.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default time allowed, from the start of an attempt, to receive the reply.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Default time allowed to send the request.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default number of attempts per call.
pub const DEFAULT_RETRIES: u32 = 3;

/// Client transport configuration.
///
/// Zero values mean "use the default"; [`ClientConfig::normalized`] applies
/// them and [`crate::ApiClient::new`] always normalizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service address, `host:port`.
    pub addr: String,
    /// Maximum wait to establish a connection.
    pub dial_timeout: Duration,
    /// Maximum wait for the full reply, measured from the start of the
    /// attempt (the write counts against it).
    pub read_timeout: Duration,
    /// Maximum wait to send the request; never extends past the read
    /// deadline.
    pub write_timeout: Duration,
    /// Maximum attempts per call.
    pub retries: u32,
    /// Longest reply line accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl ClientConfig {
    /// Defaults for everything but the address.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retries: DEFAULT_RETRIES,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Replace unset (zero) values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.dial_timeout.is_zero() {
            self.dial_timeout = DEFAULT_DIAL_TIMEOUT;
        }
        if self.read_timeout.is_zero() {
            self.read_timeout = DEFAULT_READ_TIMEOUT;
        }
        if self.write_timeout.is_zero() {
            self.write_timeout = DEFAULT_WRITE_TIMEOUT;
        }
        if self.retries == 0 {
            self.retries = DEFAULT_RETRIES;
        }
        if self.max_frame_bytes == 0 {
            self.max_frame_bytes = DEFAULT_MAX_FRAME_BYTES;
        }
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(format!("127.0.0.1:{}", DEFAULT_PORT))
    }
}

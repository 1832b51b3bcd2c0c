//! Client side of the protocol.
//!
//! [`ApiClient`] performs one request/response exchange per call over a
//! fresh connection, with bounded retries and deadlines. The dial, write and
//! read of a single attempt sit behind the [`Transport`] trait so the retry
//! policy can be exercised without a network.

pub mod api;
pub mod backoff;
pub mod cancel;
pub mod config;
pub mod transport;

pub use api::{ApiClient, ClientError};
pub use backoff::backoff;
pub use cancel::CancelToken;
pub use config::ClientConfig;
pub use transport::{TcpTransport, Transport, TransportError};

//! sshdesk protocol types
//!
//! Defines the line-delimited JSON envelopes exchanged between the sshdesk
//! front end and the backend service: one request object per line, one
//! response object per line, `\n` terminated.

pub mod codec;
pub mod codes;
pub mod error;
pub mod message;
pub mod ops;
pub mod response;

pub use codec::{decode_line, encode_line, read_frame, DEFAULT_MAX_FRAME_BYTES};
pub use error::CodecError;
pub use message::Message;
pub use response::Response;

/// TCP port the service listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8089;

/// Frame delimiter. The only byte that separates envelopes on the wire.
pub const FRAME_DELIMITER: u8 = b'\n';

//! Error types for envelope encoding and decoding.

/// Envelope codec errors.
///
/// Encoding and decoding failures are kept apart so callers can tell a
/// defective local value from a peer that spoke something else.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("encoded envelope contains a raw line terminator")]
    EmbeddedNewline,
}

impl CodecError {
    /// True for failures on the decoding side.
    pub fn is_decode(&self) -> bool {
        matches!(self, CodecError::Decode(_))
    }
}

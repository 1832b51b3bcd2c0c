//! Request envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::CodecError;

/// Request envelope.
///
/// `kind` selects the handler on the service side. `data` is kept as raw
/// JSON text and is only decoded by the handler that owns the type, so the
/// transport never needs to know payload shapes.
///
/// A `Message` has no setters; build a new one instead of changing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Box<RawValue>>,
}

impl Message {
    /// Create a message with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
        }
    }

    /// Create a message whose payload is `data` encoded as compact JSON.
    pub fn with_data<T: Serialize + ?Sized>(
        kind: impl Into<String>,
        data: &T,
    ) -> Result<Self, CodecError> {
        let raw = serde_json::value::to_raw_value(data).map_err(CodecError::Encode)?;
        Ok(Self::with_raw_data(kind, raw))
    }

    /// Create a message carrying an already-encoded payload verbatim.
    ///
    /// Whitespace inside `data` is preserved, so a payload containing a
    /// newline will be rejected when the message is framed. A JSON `null`
    /// payload is treated as no payload, matching how it decodes.
    pub fn with_raw_data(kind: impl Into<String>, data: Box<RawValue>) -> Self {
        let data = if data.get().trim() == "null" { None } else { Some(data) };
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// The request type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The raw payload, if one was sent.
    pub fn data(&self) -> Option<&RawValue> {
        self.data.as_deref()
    }

    /// Decode the payload into `T`. A missing payload decodes as JSON `null`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let text = self.data.as_deref().map(RawValue::get).unwrap_or("null");
        serde_json::from_str(text).map_err(CodecError::Decode)
    }
}

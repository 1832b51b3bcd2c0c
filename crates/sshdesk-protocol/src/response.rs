//! Response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codes;
use crate::error::CodecError;

/// Response envelope, used for success and failure alike.
///
/// `code` and `ok` are redundant but travel independently; the
/// constructors here always set them consistently and
/// [`Response::is_success`] checks both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Status code, `0` on success.
    pub code: i32,
    /// Success flag.
    pub ok: bool,
    /// Diagnostic text; present on every failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Success payload, opaque to the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// Create a success response carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            code: codes::OK,
            ok: true,
            message: None,
            data: Some(data),
        }
    }

    /// Create a success response from any serializable payload.
    pub fn success_with<T: Serialize + ?Sized>(data: &T) -> Result<Self, CodecError> {
        let value = serde_json::to_value(data).map_err(CodecError::Encode)?;
        Ok(Self::success(value))
    }

    /// Create a success response with no payload.
    pub fn empty_success() -> Self {
        Self {
            code: codes::OK,
            ok: true,
            message: None,
            data: None,
        }
    }

    /// Create a failure response.
    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            ok: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// 400: the request could not be decoded.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(codes::BAD_REQUEST, message)
    }

    /// 404: nothing handles `kind`.
    pub fn unknown_type(kind: &str) -> Self {
        Self::failure(codes::UNKNOWN_TYPE, format!("unknown type: {}", kind))
    }

    /// 500: the handler failed.
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::failure(codes::SERVER_ERROR, message)
    }

    /// True only when both the flag and the code say success.
    pub fn is_success(&self) -> bool {
        self.ok && self.code == codes::OK
    }

    /// Decode the payload into `T`. A missing payload decodes as JSON `null`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let value = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(CodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape() {
        let resp = Response::success(json!({"message": "pong"}));
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"code":0,"ok":true,"data":{"message":"pong"}}"#
        );
        assert!(resp.is_success());
    }

    #[test]
    fn test_unknown_type_wire_shape() {
        let resp = Response::unknown_type("bogus");
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"code":404,"ok":false,"message":"unknown type: bogus"}"#
        );
        assert!(!resp.is_success());
    }

    #[test]
    fn test_flag_and_code_both_checked() {
        let inconsistent = Response {
            code: codes::SERVER_ERROR,
            ok: true,
            message: None,
            data: None,
        };
        assert!(!inconsistent.is_success());

        let also_inconsistent = Response {
            code: codes::OK,
            ok: false,
            message: Some("nope".to_string()),
            data: None,
        };
        assert!(!also_inconsistent.is_success());
    }

    #[test]
    fn test_failure_always_has_message() {
        for resp in [
            Response::bad_request("invalid json"),
            Response::unknown_type("x"),
            Response::server_error("boom"),
        ] {
            assert!(!resp.ok);
            assert!(resp.message.is_some());
            assert!(resp.data.is_none());
        }
    }

    #[test]
    fn test_parse_minimal_response() {
        let resp: Response = serde_json::from_str(r#"{"code":0,"ok":true}"#).unwrap();
        assert_eq!(resp, Response::empty_success());
    }

    #[test]
    fn test_decode_data() {
        let resp = Response::success(json!({"message": "pong"}));
        let value: serde_json::Map<String, Value> = resp.decode_data().unwrap();
        assert_eq!(value["message"], "pong");
    }
}

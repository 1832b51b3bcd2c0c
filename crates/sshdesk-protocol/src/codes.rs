//! Response status codes.
//!
//! `0` is success; everything else is an error. The set is deliberately
//! small and shared verbatim with the front end.

/// Request handled successfully.
pub const OK: i32 = 0;

/// Request line could not be decoded, or its payload was malformed.
pub const BAD_REQUEST: i32 = 400;

/// No handler is registered for the request type.
pub const UNKNOWN_TYPE: i32 = 404;

/// The handler failed while processing a well-formed request.
pub const SERVER_ERROR: i32 = 500;

/// Short human-readable label for a status code.
pub fn describe(code: i32) -> &'static str {
    match code {
        OK => "ok",
        BAD_REQUEST => "bad request",
        UNKNOWN_TYPE => "unknown type",
        SERVER_ERROR => "server error",
        _ => "unrecognized code",
    }
}

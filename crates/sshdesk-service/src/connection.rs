//! Per-connection request loop.
//!
//! Reads one framed line, answers it, and only then reads the next, so
//! requests on one connection are handled strictly in arrival order. The
//! loop is generic over the reader and writer so it can be driven without a
//! socket.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use sshdesk_protocol::{decode_line, encode_line, read_frame, Message, Response};
use tracing::{error, warn};

use crate::handler::Handler;

/// Counters for one connection, returned when it closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Lines answered, including bad ones.
    pub requests: u64,
    /// Lines that did not decode as a request.
    pub bad_requests: u64,
    /// Requests whose handler failed or panicked.
    pub handler_errors: u64,
}

/// Serve requests from `reader` until end-of-stream.
///
/// Returns `Ok` on a clean end-of-stream. Read errors, a line cut off by the
/// peer, an oversize line and write errors all end the loop with `Err`; no
/// response is attempted for a line that never completed.
pub fn serve_connection<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    handler: &dyn Handler,
    max_frame_bytes: usize,
) -> io::Result<ConnectionSummary> {
    let mut summary = ConnectionSummary::default();

    while let Some(line) = read_frame(reader, max_frame_bytes)? {
        let response = respond(&line, handler, &mut summary);
        writer.write_all(&frame_response(&response)?)?;
        writer.flush()?;
        summary.requests += 1;
    }

    Ok(summary)
}

/// Build the response for one framed line. Always produces exactly one.
fn respond(line: &[u8], handler: &dyn Handler, summary: &mut ConnectionSummary) -> Response {
    let message: Message = match decode_line(line) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "json decode error");
            summary.bad_requests += 1;
            return Response::bad_request("invalid json");
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&message))) {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(msg_type = message.kind(), error = %e, "handler error");
            summary.handler_errors += 1;
            Response::server_error(e.to_string())
        }
        Err(_) => {
            error!(msg_type = message.kind(), "handler panicked");
            summary.handler_errors += 1;
            Response::server_error("internal error")
        }
    }
}

/// Encode `response`, substituting a 500 if the handler's payload cannot be
/// framed.
fn frame_response(response: &Response) -> io::Result<Vec<u8>> {
    match encode_line(response) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            warn!(error = %e, "response encode error");
            encode_line(&Response::server_error("response could not be encoded"))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
    }
}

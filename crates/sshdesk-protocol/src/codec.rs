//! Line framing for envelopes.
//!
//! An envelope is compact JSON followed by a single `\n`. serde_json escapes
//! control characters inside strings, so the delimiter can only appear in
//! the encoded form through raw payload whitespace, which `encode_line`
//! rejects.

use std::io::{self, BufRead};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::FRAME_DELIMITER;

/// Upper bound on a single line read from the wire.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Encode `value` as one framed line, delimiter included.
pub fn encode_line<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec(value).map_err(CodecError::Encode)?;
    if bytes.contains(&FRAME_DELIMITER) {
        return Err(CodecError::EmbeddedNewline);
    }
    bytes.push(FRAME_DELIMITER);
    Ok(bytes)
}

/// Decode one line. A trailing `\n` (or `\r\n`) is stripped first.
pub fn decode_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, CodecError> {
    let line = line.strip_suffix(&[FRAME_DELIMITER]).unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    serde_json::from_slice(line).map_err(CodecError::Decode)
}

/// Read one delimited frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly between frames. A stream
/// that ends part-way through a line yields `UnexpectedEof`, and a line
/// longer than `max_len` bytes yields `InvalidData`; in both cases nothing
/// of the partial line is returned. The delimiter is included in the frame.
pub fn read_frame<R: BufRead>(reader: &mut R, max_len: usize) -> io::Result<Option<Vec<u8>>> {
    let mut frame = Vec::new();
    loop {
        let (done, used) = {
            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                if frame.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before line terminator",
                ));
            }

            match available.iter().position(|&b| b == FRAME_DELIMITER) {
                Some(pos) => {
                    frame.extend_from_slice(&available[..=pos]);
                    (true, pos + 1)
                }
                None => {
                    frame.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.consume(used);

        if frame.len() > max_len.saturating_add(1) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame exceeds {} bytes", max_len),
            ));
        }
        if done {
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, Response};
    use serde_json::json;
    use serde_json::value::RawValue;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_encode_appends_single_delimiter() {
        let bytes = encode_line(&Message::new("ping")).unwrap();
        assert_eq!(bytes, b"{\"type\":\"ping\"}\n");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let msg = Message::with_data("note", &json!({"text": "line one\nline two"})).unwrap();
        let bytes = encode_line(&msg).unwrap();
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(*bytes.last().unwrap(), b'\n');
    }

    #[test]
    fn test_raw_payload_with_newline_is_rejected() {
        let raw = RawValue::from_string("{\n\"a\": 1\n}".to_string()).unwrap();
        let msg = Message::with_raw_data("note", raw);
        assert!(matches!(encode_line(&msg), Err(CodecError::EmbeddedNewline)));
    }

    #[test]
    fn test_message_round_trip_preserves_type_and_data() {
        let payloads = [
            None,
            Some(json!(null)),
            Some(json!("text with \"quotes\" and \t tabs")),
            Some(json!({"nested": {"list": [1, 2.5, true, null]}, "unicode": "\u{00e9}\u{4e2d}"})),
        ];
        for payload in payloads {
            let msg = match &payload {
                Some(value) => Message::with_data("echo", value).unwrap(),
                None => Message::new("echo"),
            };
            let decoded: Message = decode_line(&encode_line(&msg).unwrap()).unwrap();
            assert_eq!(decoded.kind(), msg.kind());
            assert_eq!(
                decoded.data().map(|d| d.get().to_string()),
                msg.data().map(|d| d.get().to_string())
            );
        }
    }

    #[test]
    fn test_decode_accepts_crlf() {
        let resp: Response = decode_line(b"{\"code\":0,\"ok\":true}\r\n").unwrap();
        assert!(resp.is_success());
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let err = decode_line::<Message>(b"not json\n").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_read_frame_sequence() {
        let mut reader = Cursor::new(b"{\"type\":\"a\"}\n{\"type\":\"b\"}\n".to_vec());
        let first = read_frame(&mut reader, DEFAULT_MAX_FRAME_BYTES).unwrap().unwrap();
        let second = read_frame(&mut reader, DEFAULT_MAX_FRAME_BYTES).unwrap().unwrap();
        assert_eq!(first, b"{\"type\":\"a\"}\n");
        assert_eq!(second, b"{\"type\":\"b\"}\n");
        assert!(read_frame(&mut reader, DEFAULT_MAX_FRAME_BYTES).unwrap().is_none());
    }

    #[test]
    fn test_read_frame_across_small_buffers() {
        let data = b"{\"type\":\"long-type-name\"}\n".to_vec();
        let mut reader = BufReader::with_capacity(3, Cursor::new(data.clone()));
        let frame = read_frame(&mut reader, DEFAULT_MAX_FRAME_BYTES).unwrap().unwrap();
        assert_eq!(frame, data);
    }

    #[test]
    fn test_read_frame_truncated_line() {
        let mut reader = Cursor::new(b"{\"type\":\"pi".to_vec());
        let err = read_frame(&mut reader, DEFAULT_MAX_FRAME_BYTES).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_frame_too_large() {
        let mut reader = Cursor::new(vec![b'x'; 64]);
        let err = read_frame(&mut reader, 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_frame_exact_limit() {
        let mut line = vec![b'x'; 16];
        line.push(b'\n');
        let mut reader = Cursor::new(line.clone());
        assert_eq!(read_frame(&mut reader, 16).unwrap().unwrap(), line);
    }
}

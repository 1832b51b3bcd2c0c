//! One dial-write-read cycle over TCP.
//!
//! Std sockets only offer per-call timeouts, so [`DeadlineStream`] turns an
//! absolute deadline into a fresh timeout before every read or write.

use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use sshdesk_protocol::read_frame;

use super::config::ClientConfig;

/// One attempt at a request/response exchange.
///
/// Implementations open their own connection, send `frame` (already
/// delimited), read one delimited reply line and close the connection
/// before returning, whatever the outcome.
pub trait Transport: Send + Sync {
    fn attempt(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Failures of a single attempt. All of them are worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("write: {0}")]
    Write(#[source] io::Error),

    #[error("read: {0}")]
    Read(#[source] io::Error),

    #[error("connection closed before a reply was received")]
    Closed,
}

impl TransportError {
    /// True when the deadline, not the peer, ended the attempt.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Dial { source, .. }
            | TransportError::Write(source)
            | TransportError::Read(source) => source.kind() == io::ErrorKind::TimedOut,
            TransportError::Closed => false,
        }
    }
}

/// Production transport: a new TCP connection per attempt.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: String,
    dial_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    max_frame_bytes: usize,
}

impl TcpTransport {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            addr: config.addr.clone(),
            dial_timeout: config.dial_timeout,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    /// Connect to the first reachable resolved address. One `dial_timeout`
    /// budget covers resolution and every address tried.
    fn dial(&self) -> Result<TcpStream, TransportError> {
        let deadline = Instant::now() + self.dial_timeout;
        let dial_err = |source| TransportError::Dial {
            addr: self.addr.clone(),
            source,
        };

        let mut last_err = None;
        for addr in self.addr.to_socket_addrs().map_err(dial_err)? {
            let Some(budget) = remaining_budget(deadline, Instant::now()) else {
                last_err = Some(deadline_exceeded());
                break;
            };
            match TcpStream::connect_timeout(&addr, budget) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(dial_err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to no endpoints")
        })))
    }
}

impl Transport for TcpTransport {
    fn attempt(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        let stream = self.dial()?;

        // One deadline for the whole connection, armed before the write and
        // never re-armed: time spent writing is taken from the read budget.
        let deadline = Instant::now() + self.read_timeout;
        let write_deadline = deadline.min(Instant::now() + self.write_timeout);

        let mut writer = DeadlineStream::new(&stream, write_deadline);
        writer.write_all(frame).map_err(TransportError::Write)?;
        writer.flush().map_err(TransportError::Write)?;

        let mut reader = BufReader::new(DeadlineStream::new(&stream, deadline));
        match read_frame(&mut reader, self.max_frame_bytes) {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(TransportError::Closed),
            Err(e) => Err(TransportError::Read(e)),
        }
    }
}

/// Socket view whose reads and writes fail once `deadline` has passed.
struct DeadlineStream<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl<'a> DeadlineStream<'a> {
    fn new(stream: &'a TcpStream, deadline: Instant) -> Self {
        Self { stream, deadline }
    }

    fn remaining(&self) -> io::Result<Duration> {
        remaining_budget(self.deadline, Instant::now()).ok_or_else(deadline_exceeded)
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.read(buf).map_err(normalize_timeout)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.set_write_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.write(buf).map_err(normalize_timeout)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stream = self.stream;
        stream.flush()
    }
}

/// Time left before `deadline`, or `None` once it has passed.
fn remaining_budget(deadline: Instant, now: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(now);
    (!left.is_zero()).then_some(left)
}

fn deadline_exceeded() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded")
}

// Unix reports an expired socket timeout as WouldBlock.
fn normalize_timeout(e: io::Error) -> io::Error {
    if e.kind() == io::ErrorKind::WouldBlock {
        deadline_exceeded()
    } else {
        e
    }
}

//! Shared helpers for the integration tests
//!
//! Runs a real service on an ephemeral loopback port and tears it down on
//! drop.

#![allow(dead_code)]

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sshdesk::ClientConfig;
use sshdesk_service::{Handler, Server, ServiceConfig, ShutdownHandle};

/// A service running on a background thread
pub struct TestService {
    pub addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestService {
    /// Serve `handler` with default settings on 127.0.0.1:0
    pub fn start(handler: impl Handler + 'static) -> Self {
        Self::start_with(ServiceConfig::default(), handler)
    }

    /// Serve `handler` with `config`; the listen address is always replaced
    pub fn start_with(config: ServiceConfig, handler: impl Handler + 'static) -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..config
        };
        let server = Server::bind(config).expect("bind test service");
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let handler: Arc<dyn Handler> = Arc::new(handler);

        let thread = thread::spawn(move || {
            server.serve(handler).expect("serve");
        });

        Self {
            addr,
            shutdown,
            thread: Some(thread),
        }
    }

    /// Client settings pointing at this service, with short timeouts
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
            ..ClientConfig::new(self.addr.to_string())
        }
    }

    /// A raw connection for speaking the wire format by hand
    pub fn raw(&self) -> RawConnection {
        RawConnection::connect(self.addr)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A plain TCP connection with line helpers
pub struct RawConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RawConnection {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set read timeout");
        let writer = stream.try_clone().expect("clone stream");
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    /// Write `line` followed by a newline
    pub fn send_line(&mut self, line: &str) {
        self.try_send_line(line).expect("write request line");
    }

    /// Like `send_line`, for peers that may already have hung up
    pub fn try_send_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(format!("{}\n", line).as_bytes())?;
        self.writer.flush()
    }

    /// Read one line without its terminator; `None` on EOF or reset
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches('\n').to_string()),
        }
    }

    /// Send one request line and return the reply line
    pub fn roundtrip(&mut self, line: &str) -> String {
        self.send_line(line);
        self.read_line().expect("response line")
    }
}

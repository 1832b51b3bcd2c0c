//! TCP server.
//!
//! One accept loop; every accepted connection is served on its own thread
//! by [`serve_connection`]. Workers share nothing but the handler.

use std::io::{self, BufReader};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::connection::serve_connection;
use crate::handler::Handler;

/// Pause after a failed accept so a persistent error (fd exhaustion) does
/// not spin the accept loop.
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(50);

/// Server errors. Only startup failures are fatal; per-connection problems
/// are logged and contained to their worker.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// A bound listener, ready to serve.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServiceConfig,
    limiter: ConnectionLimiter,
    shutdown: Arc<AtomicBool>,
    next_conn_id: AtomicU64,
}

impl Server {
    /// Bind the listener described by `config`.
    pub fn bind(config: ServiceConfig) -> Result<Self, ServerError> {
        let bind_err = |source| ServerError::Bind {
            addr: config.listen_addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&config.listen_addr).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        Ok(Self {
            listener,
            local_addr,
            limiter: ConnectionLimiter::new(config.max_connections),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.limiter.active()
    }

    /// A handle that stops the accept loop from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr: wake_addr(self.local_addr),
        }
    }

    /// Accept connections until shut down.
    ///
    /// Accept errors are logged and the loop continues. Connections that
    /// are already being served keep running after shutdown until their
    /// peers disconnect.
    pub fn serve(&self, handler: Arc<dyn Handler>) -> Result<(), ServerError> {
        info!(addr = %self.local_addr, "TCP server listening");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => self.dispatch(stream, &handler),
                Err(e) => {
                    warn!(error = %e, "accept error");
                    thread::sleep(ACCEPT_ERROR_PAUSE);
                }
            }
        }

        info!(addr = %self.local_addr, "TCP server stopped");
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, handler: &Arc<dyn Handler>) {
        let peer = stream.peer_addr().ok();
        let Some(permit) = self.limiter.try_acquire() else {
            warn!(
                peer = ?peer,
                active = self.active_connections(),
                limit = self.config.max_connections,
                "connection limit reached, closing connection"
            );
            return;
        };

        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let handler = Arc::clone(handler);
        let max_frame_bytes = self.config.max_frame_bytes;

        let spawned = thread::Builder::new()
            .name(format!("sshdesk-conn-{}", conn_id))
            .spawn(move || {
                let _permit = permit;
                handle_stream(conn_id, peer, stream, handler.as_ref(), max_frame_bytes);
            });
        if let Err(e) = spawned {
            warn!(conn = conn_id, error = %e, "failed to spawn connection worker");
        }
    }
}

/// Bind `addr` and serve `handler` on the calling thread.
pub fn start(addr: &str, handler: Arc<dyn Handler>) -> Result<(), ServerError> {
    let config = ServiceConfig {
        listen_addr: addr.to_string(),
        ..ServiceConfig::default()
    };
    Server::bind(config)?.serve(handler)
}

fn handle_stream(
    conn_id: u64,
    peer: Option<SocketAddr>,
    stream: TcpStream,
    handler: &dyn Handler,
    max_frame_bytes: usize,
) {
    debug!(conn = conn_id, peer = ?peer, "connection opened");

    let mut reader = BufReader::new(&stream);
    let mut writer = &stream;
    match serve_connection(&mut reader, &mut writer, handler, max_frame_bytes) {
        Ok(summary) => debug!(
            conn = conn_id,
            requests = summary.requests,
            bad_requests = summary.bad_requests,
            handler_errors = summary.handler_errors,
            "connection closed"
        ),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            debug!(conn = conn_id, "connection closed mid-line")
        }
        Err(e) => warn!(conn = conn_id, error = %e, "connection error"),
    }
}

/// Stops a running [`Server::serve`] loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Request shutdown. The accept loop is woken with a throwaway
    /// connection so it notices without waiting for a real client.
    pub fn shutdown(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
                debug!(error = %e, "shutdown wake-up connection failed");
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

fn wake_addr(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

/// Admission control for concurrent connections.
#[derive(Debug, Clone)]
struct ConnectionLimiter {
    active: Arc<AtomicUsize>,
    max: usize,
}

impl ConnectionLimiter {
    fn new(max: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    fn try_acquire(&self) -> Option<ConnectionPermit> {
        let max = self.max;
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (max == 0 || n < max).then_some(n + 1)
            })
            .ok()
            .map(|_| ConnectionPermit {
                active: Arc::clone(&self.active),
            })
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Held by a connection worker; releases its slot on drop.
#[derive(Debug)]
struct ConnectionPermit {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

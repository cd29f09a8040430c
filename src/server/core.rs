use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use http::Method;
use may::coroutine::JoinHandle;
use may_minihttp::HttpServer;
use tracing::info;

use crate::dispatcher::{Dispatcher, Handler, HandlerRequest};
use crate::router::RouteTable;
use crate::runtime_config::RuntimeConfig;
use crate::server::service::AppService;

/// Failure to construct or start a [`Server`].
#[derive(Debug)]
pub enum ServerError {
    /// The host/port pair did not resolve to a socket address.
    InvalidAddress {
        /// The address that failed to resolve
        addr: String,
    },
    /// The listening socket could not be bound (address in use, permission
    /// denied).
    Bind(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::InvalidAddress { addr } => {
                write!(f, "invalid listen address '{addr}'")
            }
            ServerError::Bind(e) => write!(f, "failed to bind listening socket: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(e) => Some(e),
            ServerError::InvalidAddress { .. } => None,
        }
    }
}

/// An HTTP server owning one bind address and one routing table.
///
/// Routes are registered through the verb helpers (or [`Server::add_handler`]
/// for arbitrary methods) before `start()`. `start(self)` consumes the
/// server, so the table is frozen from that point on; there is no post-start
/// registration and no locking on the request path.
pub struct Server {
    addr: SocketAddr,
    routes: RouteTable<Handler>,
}

impl Server {
    /// Create a server that will listen on `host:port`.
    ///
    /// The routing table starts empty. Address resolution happens here, so an
    /// unresolvable host or invalid address fails construction instead of
    /// surfacing later inside the accept loop.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] when `host:port` does not
    /// resolve.
    pub fn new(host: &str, port: u16) -> Result<Self, ServerError> {
        let addr = (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ServerError::InvalidAddress {
                addr: format!("{host}:{port}"),
            })?;
        Ok(Server {
            addr,
            routes: RouteTable::new(),
        })
    }

    /// Register `handler` for the given path and method.
    ///
    /// The method can be any string; it is not validated against the standard
    /// HTTP verbs. Registering a second handler for a pair that normalizes
    /// identically replaces the first.
    pub fn add_handler<F>(&mut self, path: &str, method: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.routes.add_handler(path, method, Arc::new(handler));
    }

    /// Register `handler` for GET requests at `path`.
    pub fn get<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::GET.as_str(), handler);
    }

    /// Register `handler` for POST requests at `path`.
    pub fn post<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::POST.as_str(), handler);
    }

    /// Register `handler` for PUT requests at `path`.
    pub fn put<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::PUT.as_str(), handler);
    }

    /// Register `handler` for DELETE requests at `path`.
    pub fn delete<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::DELETE.as_str(), handler);
    }

    /// Register `handler` for PATCH requests at `path`.
    pub fn patch<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::PATCH.as_str(), handler);
    }

    /// Register `handler` for HEAD requests at `path`.
    pub fn head<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.add_handler(path, Method::HEAD.as_str(), handler);
    }

    /// The address this server will bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Read access to the routing table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable<Handler> {
        &self.routes
    }

    /// Freeze the routing table, spawn the handler coroutines, and start
    /// accepting connections.
    ///
    /// The accept loop runs on its own coroutine; the caller regains control
    /// as soon as the listening socket is bound. Consuming `self` is what
    /// freezes the table: no further registration is possible, so the hot
    /// path reads the dispatcher without locks.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the listening socket cannot be
    /// bound (address in use, permission denied).
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let config = RuntimeConfig::from_env();
        let dispatcher = Arc::new(Dispatcher::new(&self.routes, &config));
        let service = AppService::new(dispatcher);

        let handle = HttpServer(service)
            .start(self.addr)
            .map_err(ServerError::Bind)?;
        info!(addr = %self.addr, "Server started");

        Ok(ServerHandle {
            addr: self.addr,
            handle,
        })
    }
}

/// Handle to a running HTTP server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound local address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections.
    ///
    /// Polls the bound address with TCP connects. Useful in tests to ensure
    /// the server is fully started before sending requests.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't become ready within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server.
    ///
    /// Cancels the accept coroutine and waits for it to finish. The listening
    /// socket closes with it: new connection attempts are refused by the OS.
    /// In-flight handler invocations are not drained.
    pub fn stop(self) {
        info!(addr = %self.addr, "Server stopping");
        // SAFETY: cancel() is marked unsafe by the may runtime. The handle is
        // valid (we own it) and cancellation during shutdown is the intended
        // use; the accept coroutine holds no resource that outlives it except
        // the listener, which must close here.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the accept loop exits.
    ///
    /// The server runs indefinitely unless stopped externally or an accept
    /// error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

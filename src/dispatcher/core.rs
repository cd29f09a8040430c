use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use ulid::Ulid;

use crate::router::{RouteError, RouteTable};
use crate::runtime_config::RuntimeConfig;

/// An opaque handler capability.
///
/// A handler receives the request view and writes its response to the
/// request's reply channel; it returns nothing. Handlers are owned by the
/// routing table for its entire lifetime.
pub type Handler = Arc<dyn Fn(HandlerRequest) + Send + Sync>;

/// Channel sender that carries requests to a handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Generate a unique request ID for log correlation (ULID string).
#[must_use]
pub fn generate_request_id() -> String {
    Ulid::new().to_string()
}

/// Request data passed to a handler coroutine.
///
/// Carries the extracted request information and the reply channel the
/// handler must answer on. The method and path are the raw values as
/// received; normalization only applies to route matching.
#[derive(Debug)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: String,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path, query string stripped
    pub path: String,
    /// HTTP headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Parsed query string parameters
    pub query_params: HashMap<String, String>,
    /// Channel for sending the response back to the dispatcher
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HashMap<String, String>,
    /// Response body. `Value::String` is written as `text/plain`, everything
    /// else as `application/json`.
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, HashMap::new(), body)
    }

    /// Create a plain-text response.
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, HashMap::new(), Value::String(body.to_string()))
    }

    /// Create a JSON error response.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value);
    }
}

/// Dispatcher that carries requests to handler coroutines.
///
/// Built once from the frozen routing table; after construction it is never
/// mutated, so resolution on the hot path needs no lock.
pub struct Dispatcher {
    senders: RouteTable<HandlerSender>,
}

impl Dispatcher {
    /// Spawn one handler coroutine per binding in `table` and freeze the
    /// resulting sender table.
    #[must_use]
    pub fn new(table: &RouteTable<Handler>, config: &RuntimeConfig) -> Self {
        let mut senders = RouteTable::new();
        for (path, method, handler) in table.iter() {
            let sender = spawn_handler(path, method, handler.clone(), config.stack_size);
            senders.add_handler(path, method, sender);
        }

        let routes_summary: Vec<String> = senders
            .iter()
            .take(10)
            .map(|(path, method, _)| format!("{} {}", method.to_uppercase(), path))
            .collect();
        info!(
            routes_count = senders.len(),
            routes_summary = ?routes_summary,
            "Routing table frozen"
        );

        Dispatcher { senders }
    }

    /// Dispatch a request to the handler bound for (path, method).
    ///
    /// Sends the request to the handler's coroutine and blocks the calling
    /// coroutine on the reply.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteError`] from resolution when no handler is bound;
    /// the caller decides how to answer (404 vs 405). A crashed handler
    /// coroutine is not an error at this level — it is answered with a 503
    /// response.
    pub fn dispatch(
        &self,
        method: &str,
        path: &str,
        headers: HashMap<String, String>,
        query_params: HashMap<String, String>,
    ) -> Result<HandlerResponse, RouteError> {
        let request_id = generate_request_id();
        debug!(request_id = %request_id, method = %method, path = %path, "Handler lookup");

        let tx = match self.senders.resolve(path, method) {
            Ok(tx) => tx,
            Err(err) => {
                warn!(request_id = %request_id, method = %method, path = %path, error = %err, "No route matched");
                return Err(err);
            }
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        let request = HandlerRequest {
            request_id: request_id.clone(),
            method: method.to_string(),
            path: path.to_string(),
            headers,
            query_params,
            reply_tx,
        };

        info!(request_id = %request_id, method = %method, path = %path, "Request dispatched to handler");
        let start = Instant::now();

        if let Err(e) = tx.send(request) {
            error!(request_id = %request_id, error = %e, "Failed to send request to handler");
            return Ok(HandlerResponse::error(503, "handler is not responding"));
        }

        match reply_rx.recv() {
            Ok(response) => {
                info!(
                    request_id = %request_id,
                    status = response.status,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Handler response received"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    request_id = %request_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Handler channel closed - handler may have crashed"
                );
                Ok(HandlerResponse::error(503, "handler is not responding"))
            }
        }
    }

    /// The methods registered for `path`, for `Allow` headers.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        self.senders.allowed_methods(path)
    }
}

/// Spawn the coroutine that services one route binding.
///
/// The coroutine receives requests in a loop. Each invocation is wrapped in
/// panic recovery: a panicking handler answers 500 on its reply channel and
/// the coroutine keeps serving subsequent requests.
fn spawn_handler(path: &str, method: &str, handler: Handler, stack_size: usize) -> HandlerSender {
    let (tx, rx) = mpsc::channel::<HandlerRequest>();
    let route = format!("{} {}", method.to_uppercase(), path);

    // SAFETY: coroutine::Builder::spawn is marked unsafe by the may runtime
    // because spawned coroutines must not hold thread-local state across
    // yields or borrow stack data from the spawning thread. The closure owns
    // everything it touches (the handler Arc, the receiver, the route label).
    #[allow(unsafe_code)]
    let spawn_result = unsafe {
        coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(route = %route, stack_size = stack_size, "Handler coroutine start");
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let request_id = req.request_id.clone();

                    if let Err(panic) =
                        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler(req);
                        }))
                    {
                        let panic_message = format!("{panic:?}");
                        error!(
                            request_id = %request_id,
                            route = %route,
                            panic_message = %panic_message,
                            "Handler panicked"
                        );
                        let _ = reply_tx.send(HandlerResponse::error(500, "handler panicked"));
                    }
                }
            })
    };

    if let Err(e) = spawn_result {
        // The receiver is gone, so every dispatch to this route answers 503.
        error!(error = %e, stack_size = stack_size, "Failed to spawn handler coroutine");
    }

    tx
}

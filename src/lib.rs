//! # microrouter
//!
//! **microrouter** is a minimal, exact-match HTTP request router for Rust,
//! powered by the `may` coroutine runtime.
//!
//! ## Overview
//!
//! microrouter does one thing: it maps an incoming request's (path, method)
//! pair to a registered handler and invokes it. Matching is literal and
//! case-insensitive — no path parameters, no wildcards, no middleware chain.
//! Connection acceptance, HTTP parsing, and response framing are delegated to
//! [`may_minihttp`](https://crates.io/crates/may_minihttp).
//!
//! ## Architecture
//!
//! The library is organized into three modules, in dependency order:
//!
//! - **[`router`]** - the routing table: registration, normalization, and
//!   resolution of (path, method) pairs to handlers
//! - **[`dispatcher`]** - coroutine-based handler invocation with panic
//!   recovery
//! - **[`server`]** - server lifecycle and the `may_minihttp` service glue
//!
//! ## Request Handling Flow
//!
//! 1. `may_minihttp` accepts a connection and parses the request
//! 2. [`server::AppService`] extracts the method, path, headers, and query
//!    string
//! 3. The dispatcher resolves (path, method) against the frozen routing table
//! 4. On a match, the request is sent to the handler's coroutine over a
//!    channel; the handler writes its response to the reply channel
//! 5. On a resolution failure the service answers for the handler: `404 Not
//!    Found` for an unknown path, `405 Method Not Allowed` (with an `Allow`
//!    header) for a known path with an unregistered method
//!
//! ## Quick Start
//!
//! ```no_run
//! use microrouter::{HandlerResponse, Server};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut server = Server::new("127.0.0.1", 8080)?;
//!     server.get("/", |req| {
//!         let _ = req.reply_tx.send(HandlerResponse::text(200, "Hello world!"));
//!     });
//!     let handle = server.start()?;
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Considerations
//!
//! microrouter uses the `may` coroutine runtime, not tokio or async-std:
//!
//! - Each registered handler runs in its own coroutine; a blocking handler
//!   stalls only its own route, never the accept loop
//! - Handler coroutine stack size is configurable via the
//!   `MICROROUTER_STACK_SIZE` environment variable
//! - The routing table is frozen when `start()` is called; there is no
//!   post-start registration and therefore no locking on the hot path

pub mod dispatcher;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{
    generate_request_id, Dispatcher, Handler, HandlerRequest, HandlerResponse, HandlerSender,
};
pub use router::{RouteError, RouteTable};
pub use server::{AppService, Server, ServerError, ServerHandle};

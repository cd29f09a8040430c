//! # Dispatcher Module
//!
//! The dispatcher module provides coroutine-based handler invocation for
//! microrouter. It owns one `may` coroutine per registered route and the
//! channel plumbing that carries each request to its handler and the response
//! back.
//!
//! ## Overview
//!
//! The dispatcher is built once, at server start, from the frozen routing
//! table. For every (path, method) binding it:
//!
//! - Spawns a coroutine that receives [`HandlerRequest`]s from an MPSC
//!   channel in a loop
//! - Wraps each handler invocation in panic recovery, so a failing handler
//!   answers 500 instead of taking down the accept loop
//!
//! ## Request Flow
//!
//! 1. [`Dispatcher::dispatch`] resolves (path, method) against the sender
//!    table
//! 2. A [`HandlerRequest`] with a fresh reply channel is sent to the
//!    handler's coroutine
//! 3. The handler writes exactly one [`HandlerResponse`] to `reply_tx`
//! 4. `dispatch` blocks the calling coroutine on the reply and returns it
//!
//! ## Error Handling
//!
//! - Resolution failures surface as [`crate::router::RouteError`] so the
//!   service can answer 404 or 405
//! - Handler panics are caught and converted to 500 responses
//! - A crashed handler coroutine (closed channel) yields a 503 response
//!   rather than a dropped connection

mod core;

pub use core::{
    generate_request_id, Dispatcher, Handler, HandlerRequest, HandlerResponse, HandlerSender,
};

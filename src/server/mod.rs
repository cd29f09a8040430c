//! # Server Module
//!
//! Server lifecycle and the `may_minihttp` transport glue.
//!
//! [`Server`] owns the bind address and the routing table during
//! registration. `start()` freezes the table into a
//! [`crate::dispatcher::Dispatcher`], wraps it in an [`AppService`] (the
//! single top-level handler registered with the transport), and returns a
//! [`ServerHandle`] for lifecycle control.

mod core;
pub mod request;
pub mod response;
pub mod service;

pub use core::{Server, ServerError, ServerHandle};
pub use request::{parse_query_params, parse_request, ParsedRequest};
pub use service::AppService;

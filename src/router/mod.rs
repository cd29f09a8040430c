//! # Router Module
//!
//! The router module provides the routing table for microrouter: registration
//! and resolution of (path, method) pairs to handler bindings.
//!
//! ## Overview
//!
//! The table is responsible for:
//! - Storing at most one binding per normalized (path, method) pair
//! - Normalizing paths and methods so matching is case-insensitive
//! - Resolving incoming requests to bindings, distinguishing an unknown path
//!   from a known path with an unsupported method
//!
//! ## Matching semantics
//!
//! Matching is exact and literal. `/items` matches `/items`, `/Items`, and
//! `/ITEMS`, and nothing else — there are no path parameters and no
//! wildcards. Registering a second handler for a pair that normalizes
//! identically replaces the first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use microrouter::router::{RouteError, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.add_handler("/items", "GET", handler);
//!
//! match table.resolve("/Items", "get") {
//!     Ok(handler) => { /* invoke it */ }
//!     Err(RouteError::NoHandlerForPath) => { /* 404 */ }
//!     Err(RouteError::MethodNotSupported { allowed }) => { /* 405 + Allow */ }
//! }
//! ```

mod core;

pub use core::{RouteError, RouteTable};

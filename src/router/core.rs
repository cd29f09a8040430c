use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

/// Resolution failure returned by [`RouteTable::resolve`].
///
/// The two variants let callers answer an unknown path differently from a
/// known path with an unsupported method (404 vs 405).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No route exists for the given path, under any method.
    NoHandlerForPath,
    /// The path is registered, but not for the requested method.
    MethodNotSupported {
        /// The methods registered for this path, uppercased and sorted.
        /// Suitable for an `Allow` response header.
        allowed: Vec<String>,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::NoHandlerForPath => write!(f, "no handler for path"),
            RouteError::MethodNotSupported { allowed } => {
                write!(
                    f,
                    "no handler for method (allowed: {})",
                    allowed.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Routing table mapping normalized (path, method) pairs to bindings.
///
/// The table is a nested map: normalized path → (normalized method →
/// binding). It is generic over the binding type so the same normalization
/// and lookup logic serves both registration (`H = Handler`) and the
/// dispatcher's frozen sender table (`H = HandlerSender`).
///
/// Both components of the key are lowercased on the way in and on lookup, so
/// two raw-case variants that normalize identically refer to the same route.
/// Registering a second binding for the same normalized pair replaces the
/// first (last write wins); the replacement is logged, never silent.
pub struct RouteTable<H> {
    routes: HashMap<String, HashMap<String, H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    /// Create an empty routing table.
    #[must_use]
    pub fn new() -> Self {
        RouteTable {
            routes: HashMap::new(),
        }
    }

    /// Register `handler` for the given path and method.
    ///
    /// Accepts any path string (including empty) and any method string; the
    /// method is not validated against the standard HTTP verbs. Always
    /// succeeds. If a binding already exists for the normalized pair it is
    /// replaced and the old binding is dropped.
    pub fn add_handler(&mut self, path: &str, method: &str, handler: H) {
        let path_key = path.to_lowercase();
        let method_key = method.to_lowercase();

        let replaced = self
            .routes
            .entry(path_key.clone())
            .or_default()
            .insert(method_key.clone(), handler)
            .is_some();

        if replaced {
            warn!(
                path = %path_key,
                method = %method_key,
                "Replaced existing route binding"
            );
        } else {
            debug!(path = %path_key, method = %method_key, "Route registered");
        }
    }

    /// Resolve a raw (path, method) pair, as received from a request, to its
    /// binding.
    ///
    /// Both inputs are normalized with the same scheme used at registration
    /// time. Resolution is a pure read and is safe to call concurrently with
    /// other resolutions.
    ///
    /// # Errors
    ///
    /// * [`RouteError::NoHandlerForPath`] if the path is unknown
    /// * [`RouteError::MethodNotSupported`] if the path is known but has no
    ///   binding for this method; carries the path's registered methods
    #[must_use = "resolution failures distinguish 404 from 405"]
    pub fn resolve(&self, path: &str, method: &str) -> Result<&H, RouteError> {
        let methods = self
            .routes
            .get(&path.to_lowercase())
            .ok_or(RouteError::NoHandlerForPath)?;
        match methods.get(&method.to_lowercase()) {
            Some(handler) => Ok(handler),
            None => Err(RouteError::MethodNotSupported {
                allowed: uppercase_sorted(methods),
            }),
        }
    }

    /// The methods registered for `path`, uppercased and sorted. Empty when
    /// the path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        self.routes
            .get(&path.to_lowercase())
            .map(uppercase_sorted)
            .unwrap_or_default()
    }

    /// Number of (path, method) bindings in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over all (path, method, binding) entries, keys normalized.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &H)> {
        self.routes.iter().flat_map(|(path, methods)| {
            methods
                .iter()
                .map(move |(method, handler)| (path.as_str(), method.as_str(), handler))
        })
    }

    /// Print all registered routes to stdout.
    ///
    /// Useful for debugging and verifying that routes are loaded correctly.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.len());
        for (path, method, _) in self.iter() {
            println!("[route] {} {}", method.to_uppercase(), path);
        }
    }
}

fn uppercase_sorted<H>(methods: &HashMap<String, H>) -> Vec<String> {
    let mut allowed: Vec<String> = methods.keys().map(|m| m.to_uppercase()).collect();
    allowed.sort();
    allowed
}

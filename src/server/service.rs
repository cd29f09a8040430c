use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;

use super::request::{parse_request, ParsedRequest};
use super::response::{write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;
use crate::router::RouteError;

/// The single top-level handler registered with the transport collaborator.
///
/// `may_minihttp` hands every parsed request to `call`, which re-dispatches
/// through the frozen routing table. Cloned per connection by the transport;
/// the dispatcher is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ParsedRequest {
            method,
            path,
            headers,
            query_params,
        } = parse_request(req);

        match self.dispatcher.dispatch(&method, &path, headers, query_params) {
            Ok(hr) => {
                write_handler_response(res, hr.status, &hr.headers, hr.body);
            }
            Err(RouteError::NoHandlerForPath) => {
                write_json_error(
                    res,
                    404,
                    &HashMap::new(),
                    json!({"error": "Not Found", "method": method, "path": path}),
                );
            }
            Err(RouteError::MethodNotSupported { allowed }) => {
                let mut headers = HashMap::new();
                headers.insert("Allow".to_string(), allowed.join(", "));
                write_json_error(
                    res,
                    405,
                    &headers,
                    json!({"error": "Method Not Allowed", "method": method, "path": path}),
                );
            }
        }
        Ok(())
    }
}

use std::collections::HashMap;

use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

// may_minihttp only accepts 'static header lines.
fn apply_header(res: &mut Response, name: &str, value: &str) {
    let line = format!("{name}: {value}").into_boxed_str();
    res.header(Box::leak(line));
}

/// Write a handler's response through the transport's response sink.
///
/// `Value::String` bodies are written as `text/plain`, everything else as
/// `application/json`. A `Content-Type` in `headers` takes precedence.
pub fn write_handler_response(
    res: &mut Response,
    status: u16,
    headers: &HashMap<String, String>,
    body: Value,
) {
    res.status_code(status as usize, status_reason(status));

    let mut has_content_type = false;
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        apply_header(res, name, value);
    }

    match body {
        Value::String(s) => {
            if !has_content_type {
                res.header("Content-Type: text/plain");
            }
            res.body_vec(s.into_bytes());
        }
        other => {
            if !has_content_type {
                res.header("Content-Type: application/json");
            }
            res.body_vec(serde_json::to_vec(&other).unwrap_or_default());
        }
    }
}

/// Write a JSON error body with the given status and extra headers.
pub fn write_json_error(
    res: &mut Response,
    status: u16,
    headers: &HashMap<String, String>,
    body: Value,
) {
    res.status_code(status as usize, status_reason(status));
    for (name, value) in headers {
        apply_header(res, name, value);
    }
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

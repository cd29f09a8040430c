//! End-to-end tests for the HTTP server.
//!
//! Each test spins up a real server on a random loopback port, sends raw
//! HTTP/1.1 over a `TcpStream`, and asserts on the wire-level response. The
//! fixture stops the server on drop so a panicking test never leaks a port.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use microrouter::{HandlerResponse, Server, ServerHandle};
use serde_json::json;

mod common;
use common::test_server::setup_may_runtime;

/// Test fixture with automatic teardown using RAII.
struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl TestServer {
    /// Build a server on a random free loopback port, let `register` add its
    /// routes, start it, and wait until it accepts connections.
    fn start(register: impl FnOnce(&mut Server)) -> Self {
        setup_may_runtime();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut server = Server::new("127.0.0.1", port).unwrap();
        register(&mut server);
        let handle = server.start().unwrap();
        handle.wait_ready().unwrap();

        let addr = handle.addr();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

fn send_request(addr: &SocketAddr, req: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(e) => panic!("read error: {:?}", e),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn get(addr: &SocketAddr, path: &str) -> String {
    send_request(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    )
}

/// Split a raw response into (status, header block, body).
fn parse_response(resp: &str) -> (u16, String, String) {
    let mut parts = resp.splitn(2, "\r\n\r\n");
    let head = parts.next().unwrap_or("");
    let body = parts.next().unwrap_or("");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    (status, head.to_string(), body.to_string())
}

#[test]
fn test_supports_get() {
    let server = TestServer::start(|s| {
        s.get("/", |req| {
            let _ = req.reply_tx.send(HandlerResponse::text(200, "Hello world!"));
        });
    });

    let (status, head, body) = parse_response(&get(&server.addr(), "/"));
    assert_eq!(status, 200);
    assert!(head.contains("Content-Type: text/plain"), "head: {head}");
    assert_eq!(body, "Hello world!");
}

#[test]
fn test_matching_is_case_insensitive_end_to_end() {
    let server = TestServer::start(|s| {
        s.get("/Items", |req| {
            let _ = req
                .reply_tx
                .send(HandlerResponse::json(200, json!({ "items": [] })));
        });
    });

    let (status, _head, body) = parse_response(&get(&server.addr(), "/ITEMS"));
    assert_eq!(status, 200);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&body).unwrap(),
        json!({ "items": [] })
    );
}

#[test]
fn test_unknown_path_answers_404() {
    let server = TestServer::start(|s| {
        s.get("/items", |req| {
            let _ = req.reply_tx.send(HandlerResponse::text(200, "ok"));
        });
    });

    let (status, _head, body) = parse_response(&get(&server.addr(), "/missing"));
    assert_eq!(status, 404);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/missing");
}

#[test]
fn test_unsupported_method_answers_405_with_allow() {
    let server = TestServer::start(|s| {
        s.get("/items", |req| {
            let _ = req.reply_tx.send(HandlerResponse::text(200, "ok"));
        });
    });

    let resp = send_request(
        &server.addr(),
        "POST /items HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    );
    let (status, head, body) = parse_response(&resp);
    assert_eq!(status, 405);
    assert!(head.contains("Allow: GET"), "head: {head}");
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Method Not Allowed");
}

#[test]
fn test_query_string_does_not_affect_matching() {
    let server = TestServer::start(|s| {
        s.get("/search", |req| {
            let q = req.get_query_param("q").unwrap_or("").to_string();
            let _ = req
                .reply_tx
                .send(HandlerResponse::json(200, json!({ "q": q })));
        });
    });

    let (status, _head, body) = parse_response(&get(&server.addr(), "/search?q=rust"));
    assert_eq!(status, 200);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["q"], "rust");
}

#[test]
fn test_stop_refuses_new_connections() {
    let server = TestServer::start(|s| {
        s.get("/", |req| {
            let _ = req.reply_tx.send(HandlerResponse::text(200, "Hello world!"));
        });
    });
    let addr = server.addr();

    let (status, _head, _body) = parse_response(&get(&addr, "/"));
    assert_eq!(status, 200);

    server.stop();

    let mut refused = false;
    for _ in 0..50 {
        if TcpStream::connect(addr).is_err() {
            refused = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(refused, "server still accepting after stop");
}

#[test]
fn test_verb_helpers_register_distinct_handlers() {
    let server = TestServer::start(|s| {
        s.get("/items", |req| {
            let _ = req
                .reply_tx
                .send(HandlerResponse::json(200, json!({ "op": "list" })));
        });
        s.post("/items", |req| {
            let _ = req
                .reply_tx
                .send(HandlerResponse::json(201, json!({ "op": "create" })));
        });
        s.delete("/items", |req| {
            let _ = req
                .reply_tx
                .send(HandlerResponse::json(200, json!({ "op": "delete" })));
        });
    });

    let (status, _head, body) = parse_response(&get(&server.addr(), "/items"));
    assert_eq!(status, 200);
    assert!(body.contains("list"));

    let resp = send_request(
        &server.addr(),
        "POST /items HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    );
    let (status, _head, body) = parse_response(&resp);
    assert_eq!(status, 201);
    assert!(body.contains("create"));

    let resp = send_request(
        &server.addr(),
        "DELETE /items HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    let (status, _head, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert!(body.contains("delete"));
}

#[test]
fn test_bind_failure_is_surfaced() {
    let server = TestServer::start(|s| {
        s.get("/", |req| {
            let _ = req.reply_tx.send(HandlerResponse::text(200, "ok"));
        });
    });

    // The port is taken by the running fixture, so a second start must fail.
    let second = Server::new("127.0.0.1", server.addr().port()).unwrap();
    assert!(matches!(
        second.start(),
        Err(microrouter::ServerError::Bind(_))
    ));
}

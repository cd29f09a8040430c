use microrouter::{HandlerResponse, Server};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut server = Server::new("127.0.0.1", 8080)?;

    server.get("/", |req| {
        let _ = req.reply_tx.send(HandlerResponse::text(200, "Hello world!"));
    });
    server.get("/health", |req| {
        let _ = req
            .reply_tx
            .send(HandlerResponse::json(200, json!({ "status": "ok" })));
    });

    server.routes().dump_routes();

    let handle = server.start()?;
    println!("listening on http://{}", handle.addr());

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("accept loop panicked"))?;
    Ok(())
}

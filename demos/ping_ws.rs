//! A WebSocket server that drives the connection adapter directly.
//!
//! This demo upgrades requests with `new_conn` and runs its own read loop
//! instead of the bundled session driver. It answers `ping` requests with
//! `pong`, answers `ping` notifications with a `pong` notification, and pushes
//! a `heartbeat` notification from a second task every few seconds to show
//! writes happening alongside the read loop.
//!
//! This demo requires the "axum" feature to be enabled.
//!
//! Usage:
//!
//! ```bash
//! cargo run --example ping_ws
//! ```
//!
//! Then connect and send:
//!
//! ```bash
//! websocat ws://127.0.0.1:3000/ws
//! {"jsonrpc":"2.0","method":"ping","id":1}
//! ```
//!
//! Expected response:
//!
//! ```json
//! {"id":1,"jsonrpc":"2.0","result":"pong"}
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use json_rpc_ws::{NativeConn, new_conn};
use serde_json::{Value, json};
use tracing::{info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Build the reply for one inbound message, if it needs one.
fn reply_to(message: &[u8]) -> Option<Value> {
    let value: Value = match serde_json::from_slice(message) {
        Ok(value) => value,
        Err(_) => {
            return Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32700, "message": "Parse error"},
                "id": null
            }));
        }
    };

    let method = value.get("method").and_then(Value::as_str);
    match (method, value.get("id")) {
        (Some("ping"), Some(id)) => Some(json!({"jsonrpc": "2.0", "result": "pong", "id": id})),
        (Some("ping"), None) => Some(json!({"jsonrpc": "2.0", "method": "pong"})),
        (Some(method), Some(id)) => Some(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": format!("Unknown method: {}", method)},
            "id": id
        })),
        _ => None,
    }
}

async fn ws(request: Request) -> Response {
    let upgraded = new_conn(request, |conn| async move {
        let conn = Arc::new(conn);
        info!("Client connected");

        let heartbeat = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move {
                let beat = json!({"jsonrpc": "2.0", "method": "heartbeat"}).to_string();
                loop {
                    tokio::time::sleep(HEARTBEAT_INTERVAL).await;
                    if conn.write(beat.as_bytes()).await.is_err() {
                        break;
                    }
                }
            }
        });

        while let Ok(message) = conn.next().await {
            let Some(reply) = reply_to(&message) else {
                continue;
            };
            if let Err(e) = conn.write(reply.to_string().as_bytes()).await {
                warn!("Failed to send reply: {}", e);
                break;
            }
        }

        heartbeat.abort();
        match conn.close().await {
            Ok(()) => info!("Client disconnected"),
            Err(e) => warn!("Client connection ended abnormally: {}", e),
        }
    });

    match upgraded.await {
        Ok(response) => response,
        Err(e) => {
            warn!("Rejected connection: {}", e);
            e.into_response()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let app = Router::new().route("/ws", get(ws));

    let addr: std::net::SocketAddr = "127.0.0.1:3000".parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("Server started on http://{}", local_addr);
    info!("WebSocket endpoint: ws://{}/ws", local_addr);
    info!("Available methods:");
    info!("  - ping: Answers with pong");

    axum::serve(listener, app).await?;

    Ok(())
}

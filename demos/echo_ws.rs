//! A WebSocket echo server for JSON-RPC payloads.
//!
//! This demo serves `/ws` with the json-rpc-ws axum handler. Every message a
//! client sends comes back unchanged as one text frame, which is enough to
//! watch the framing and close handling from any WebSocket client.
//!
//! This demo requires the "axum" feature to be enabled.
//!
//! Usage:
//!
//! ```bash
//! cargo run --example echo_ws
//! ```
//!
//! Then connect and send a message:
//!
//! ```bash
//! websocat ws://127.0.0.1:3000/ws
//! {"jsonrpc":"2.0","method":"echo","params":{"message":"hello"},"id":1}
//! ```
//!
//! Expected response:
//!
//! ```json
//! {"jsonrpc":"2.0","method":"echo","params":{"message":"hello"},"id":1}
//! ```

use std::sync::Arc;

use anyhow::Result;

use axum::Router;
use axum::routing::get;
use json_rpc_ws::MessageHandler;
use json_rpc_ws::axum::handler;
use tracing::{debug, info};

struct Echo;

impl MessageHandler for Echo {
    async fn handle(&self, message: Vec<u8>) -> Option<Vec<u8>> {
        debug!("Echoing {} bytes", message.len());
        Some(message)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let app = Router::new()
        .route("/ws", get(handler::<Echo>))
        .with_state(Arc::new(Echo));

    let addr: std::net::SocketAddr = "127.0.0.1:3000".parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("Server started on http://{}", local_addr);
    info!("WebSocket endpoint: ws://{}/ws", local_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

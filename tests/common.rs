//! Common utilities for integration tests.
//!
//! This module provides shared functionality for integration tests that talk to
//! a real WebSocket endpoint. It starts an axum server in-process on an
//! ephemeral port and connects WebSocket clients to it.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Client side of a test connection.
pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Install a tracing subscriber for the test binary.
///
/// Honors `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serve `app` on an ephemeral localhost port.
///
/// The server runs until the test's runtime shuts down. Returns the bound
/// address.
pub async fn spawn_server(app: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Test server error: {}", e);
        }
    });

    Ok(addr)
}

/// Build the `ws://` URL for `path` on `addr`.
pub fn ws_url(addr: SocketAddr, path: &str) -> String {
    format!("ws://{}{}", addr, path)
}

/// Connect a WebSocket client to `path` on `addr`.
pub async fn connect(addr: SocketAddr, path: &str) -> Result<Client> {
    let (client, _response) = connect_async(ws_url(addr, path))
        .await
        .context("WebSocket handshake failed")?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_uses_ws_scheme() {
        let addr: SocketAddr = "127.0.0.1:3001".parse().unwrap();
        assert_eq!(ws_url(addr, "/ws"), "ws://127.0.0.1:3001/ws");
    }
}

//! Axum integration for WebSocket connections.
//!
//! This module provides an axum handler that upgrades the request and serves
//! the resulting connection with a [`MessageHandler`]. Enable the `axum`
//! feature in Cargo.toml to use it (it is on by default).
//!
//! Axum owns the HTTP side (routing, listening, anything in front of the
//! endpoint); this crate takes over once the request reaches the handler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::Router;
//! use axum::routing::get;
//! use json_rpc_ws::axum::handler;
//! use json_rpc_ws::session::MessageHandler;
//!
//! struct Echo;
//!
//! impl MessageHandler for Echo {
//!     async fn handle(&self, message: Vec<u8>) -> Option<Vec<u8>> {
//!         Some(message)
//!     }
//! }
//!
//! let app: Router = Router::new()
//!     .route("/ws", get(handler::<Echo>))
//!     .with_state(Arc::new(Echo));
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};

use crate::session::{MessageHandler, serve};
use crate::upgrade::new_conn;

/// Axum handler for WebSocket connections.
///
/// Upgrades the request with the default upgrader and spawns a task that runs
/// [`serve`] for the connection. A request that cannot be upgraded gets the
/// handshake's rejection response.
pub async fn handler<H>(State(message_handler): State<Arc<H>>, request: Request) -> Response
where
    H: MessageHandler + 'static,
{
    let upgraded = new_conn(request, move |conn| async move {
        tracing::debug!("WebSocket connection opened");
        if let Err(e) = serve(&conn, message_handler.as_ref()).await {
            tracing::debug!("WebSocket session ended abnormally: {}", e);
        }
    });

    match upgraded.await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to upgrade connection: {}", e);
            e.into_response()
        }
    }
}

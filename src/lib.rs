//! A WebSocket connection adapter for message-framed JSON-RPC engines.
//!
//! This library sits between a JSON-RPC engine and a WebSocket connection. The
//! engine deals in whole JSON messages with no delimiters of its own; the
//! adapter upgrades the HTTP request, maps each message to exactly one
//! WebSocket frame, and turns the many ways a session can end into one
//! "connection ended" signal.
//!
//! # Design Goals
//!
//! The engine-facing surface is three operations: write one message, wait for
//! the next message, close. Frame types, control frames and close codes stay
//! inside the adapter. A peer that simply disconnects (going away, normal
//! closure, no status) is not an error when closing.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! [`upgrade`] performs the HTTP-to-WebSocket handshake with fixed 1024-byte
//! buffers and an origin check that accepts every origin, yielding a
//! [`NativeConnAdapter`]. Requires the `axum` feature.
//!
//! [`conn`] defines the [`NativeConn`] contract and the adapter implementing
//! it over any [`Transport`].
//!
//! [`transports`] defines the [`Transport`] trait and provides implementations.
//! `WsTransport` wraps an upgraded axum socket, while [`InMemory`] is useful
//! for testing.
//!
//! [`close`] holds [`CloseCode`] and the set of codes treated as normal
//! termination.
//!
//! [`session`] provides a read loop that serves one connection with a
//! [`MessageHandler`].
//!
//! [`axum`](mod@crate::axum) provides an axum handler that upgrades and serves
//! connections. Requires the `axum` feature.
//!
//! [`error`] defines the errors of the adapter operations.
//!
//! # Quick Start
//!
//! Serve WebSocket connections from an axum router:
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
//! # async fn run() -> std::io::Result<()> {
//! let app = Router::new()
//!     .route("/ws", get(handler::<Echo>))
//!     .with_state(Arc::new(Echo));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await
//! # }
//! ```
//!
//! # Driving a Connection
//!
//! An engine that runs its own loop uses the adapter directly:
//!
//! ```no_run
//! use json_rpc_ws::{NativeConn, NativeConnAdapter};
//! use json_rpc_ws::transports::InMemory;
//!
//! # async fn run() -> Result<(), json_rpc_ws::Error> {
//! let (transport, _peer) = InMemory::pair();
//! let conn = NativeConnAdapter::new(transport);
//!
//! while let Ok(message) = conn.next().await {
//!     conn.write(&message).await?;
//! }
//!
//! // Ordinary disconnects close without error
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Adapter operations take `&self`. One task can wait in `next` while others
//! call `write`; closing from any task releases a pending `next`. Keep at most
//! one `write` in flight per connection. The WebSocket transport serializes
//! frame writes, other transports may not.

pub use close::{CloseCode, NORMAL_CLOSE_CODES};
pub use conn::{NativeConn, NativeConnAdapter};
pub use error::Error;
pub use session::MessageHandler;
pub use transports::{InMemory, Transport};
#[cfg(feature = "axum")]
pub use upgrade::{DEFAULT_UPGRADER, UpgradeError, Upgrader, new_conn};

#[cfg(feature = "axum")]
pub mod axum;
pub mod close;
pub mod conn;
pub mod error;
pub mod session;
pub mod transports;
#[cfg(feature = "axum")]
pub mod upgrade;

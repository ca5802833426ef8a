//! Transport implementations for WebSocket-backed connections.
//!
//! This module provides the transports a [`NativeConnAdapter`](crate::NativeConnAdapter)
//! can wrap: the axum-backed WebSocket transport and an in-memory pair for
//! tests. All transports implement the common [`Transport`] trait, making them
//! interchangeable.

pub use in_memory::InMemory;
pub use transport::{FrameKind, Transport, TransportError};
#[cfg(feature = "axum")]
pub use websocket::WsTransport;

pub mod in_memory;
pub mod transport;
#[cfg(feature = "axum")]
pub mod websocket;

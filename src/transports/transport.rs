//! Transport trait for WebSocket-backed connections.
//!
//! This module defines the minimal interface the connection adapter needs from
//! an upgraded WebSocket session: write one frame, read one frame, close.
//! Keeping it this small lets the adapter run against the in-memory pair in
//! tests exactly as it runs against a real socket.

use std::future::Future;
use std::io;

use crate::close::CloseCode;

/// Frame type of a WebSocket data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
}

/// Errors reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The session ended with the given close code.
    ///
    /// Reads report this when the peer's close frame arrives; `close` reports
    /// it with the code the closing handshake settled on.
    #[error("Connection closed with code {code}")]
    Closed { code: CloseCode, reason: String },

    /// A text frame was requested for a payload that is not UTF-8.
    #[error("Invalid text payload: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    /// Error raised by the underlying WebSocket implementation.
    #[error("WebSocket error: {0}")]
    WebSocket(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Transport I/O error.
    #[error("Transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Create a close error without a reason.
    pub fn closed(code: CloseCode) -> Self {
        Self::Closed {
            code,
            reason: String::new(),
        }
    }

    /// Wrap an error from the WebSocket implementation.
    pub fn websocket(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::WebSocket(error.into())
    }

    /// The close code carried by this error, if it is a close error.
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::Closed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Trait defining the interface for WebSocket transports.
///
/// A transport owns one upgraded session. Reads and writes are independent
/// streams: an implementation must allow `read_frame` to be pending while
/// `write_frame` or `close` runs from another task.
pub trait Transport: Send + Sync {
    /// Send `payload` as exactly one WebSocket message of the given kind.
    ///
    /// The frame is finalized (flushed to the socket) before this returns.
    fn write_frame(
        &self,
        kind: FrameKind,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next data message.
    ///
    /// Control frames are handled internally. A close frame from the peer, or
    /// the end of the stream, is reported as [`TransportError::Closed`].
    fn read_frame(&self) -> impl Future<Output = Result<(FrameKind, Vec<u8>), TransportError>> + Send;

    /// Close the session.
    ///
    /// The outcome of the closing handshake is reported as
    /// [`TransportError::Closed`] with the code the session ended with;
    /// deciding whether that code is a fault is left to the caller.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

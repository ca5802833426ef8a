//! Error types for the connection adapter.
//!
//! Each adapter operation fails with its own variant so the RPC engine can tell
//! a failed write from the end of the read stream. The transport error that
//! caused the failure is kept as the source.

use crate::transports::TransportError;

/// Errors returned by [`NativeConn`](crate::NativeConn) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening, writing or finalizing an outbound frame failed.
    #[error("Write error: {0}")]
    WriteError(#[source] TransportError),

    /// Reading the next inbound message failed, including a peer close.
    ///
    /// A read loop should treat this as the end of the connection.
    #[error("Read error: {0}")]
    ReadError(#[source] TransportError),

    /// The connection ended with an abnormal close code, or closing failed
    /// outright.
    #[error("Close error: {0}")]
    CloseError(#[source] TransportError),

    /// The adapter was already closed.
    #[error("Connection is closed")]
    ConnectionClosed,
}

impl Error {
    /// Close code carried by the underlying transport error, if any.
    pub fn close_code(&self) -> Option<crate::CloseCode> {
        match self {
            Self::WriteError(e) | Self::ReadError(e) | Self::CloseError(e) => e.close_code(),
            Self::ConnectionClosed => None,
        }
    }
}

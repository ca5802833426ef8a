//! Message-oriented connection adapter.
//!
//! [`NativeConnAdapter`] wraps one [`Transport`] and exposes the three
//! operations a JSON-RPC engine needs: write one message, wait for the next
//! message, and close. WebSocket frame types and close codes stop here; the
//! engine only sees whole messages and a uniform "connection ended" error.

use std::future::Future;

use tokio::sync::watch;
use tracing::trace;

use crate::error::Error;
use crate::transports::{FrameKind, Transport};

/// Connection contract consumed by a JSON-RPC engine.
///
/// Every message is one complete JSON document; there is no framing of its
/// own on top of the transport's messages.
pub trait NativeConn: Send + Sync {
    /// Send one complete message.
    fn write(&self, message: &[u8]) -> impl Future<Output = Result<(), Error>> + Send;

    /// Wait for the next complete inbound message.
    ///
    /// Any error means the connection has ended and the read loop should stop.
    fn next(&self) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;

    /// Close the connection.
    ///
    /// Ordinary teardown (going away, normal closure, no status) is reported
    /// as success.
    fn close(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// [`NativeConn`] implementation over a WebSocket transport.
///
/// The adapter is `Open` from construction until the first call to `close`,
/// after which it is `Closed` for good. `next` may run in one task while
/// `write` runs in another. Callers should keep at most one `write` in flight;
/// the transport decides whether overlapping writes are serialized.
///
/// # Example
///
/// ```no_run
/// use json_rpc_ws::transports::InMemory;
/// use json_rpc_ws::{NativeConn, NativeConnAdapter};
///
/// # async fn demo() -> Result<(), json_rpc_ws::Error> {
/// let (transport, _peer) = InMemory::pair();
/// let conn = NativeConnAdapter::new(transport);
///
/// conn.write(br#"{"jsonrpc":"2.0","method":"ping"}"#).await?;
/// let reply = conn.next().await?;
/// conn.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NativeConnAdapter<T> {
    transport: T,
    closed: watch::Sender<bool>,
}

impl<T: Transport> NativeConnAdapter<T> {
    /// Wrap an upgraded transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            closed: watch::Sender::new(false),
        }
    }

    /// Check whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

/// Resolves once the adapter is marked closed.
async fn wait_closed(mut closed: watch::Receiver<bool>) {
    // The sender lives as long as the adapter, so an error here cannot race a
    // pending read.
    let _ = closed.wait_for(|closed| *closed).await;
}

impl<T: Transport> NativeConn for NativeConnAdapter<T> {
    async fn write(&self, message: &[u8]) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.transport
            .write_frame(FrameKind::Text, message)
            .await
            .map_err(Error::WriteError)
    }

    async fn next(&self) -> Result<Vec<u8>, Error> {
        let closed = self.closed.subscribe();
        let already_closed = *closed.borrow();
        if already_closed {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            frame = self.transport.read_frame() => {
                let (kind, payload) = frame.map_err(Error::ReadError)?;
                trace!("Received {:?} message of {} bytes", kind, payload.len());
                Ok(payload)
            }
            _ = wait_closed(closed) => Err(Error::ConnectionClosed),
        }
    }

    async fn close(&self) -> Result<(), Error> {
        if self.closed.send_replace(true) {
            return Ok(());
        }

        match self.transport.close().await {
            Ok(()) => Ok(()),
            Err(e) if e.close_code().is_some_and(|code| code.is_normal_closure()) => {
                trace!("Connection closed normally: {}", e);
                Ok(())
            }
            Err(e) => Err(Error::CloseError(e)),
        }
    }
}

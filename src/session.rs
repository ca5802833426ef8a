//! Read loop that drives one connection.
//!
//! [`serve`] pulls messages from a [`NativeConn`] until it ends, hands each one
//! to a [`MessageHandler`], and writes back whatever the handler returns. It
//! knows nothing about JSON-RPC; the handler is where an engine plugs in.

use std::future::Future;

use tracing::{debug, warn};

use crate::conn::NativeConn;
use crate::error::Error;

/// Handler for inbound messages.
///
/// Returning `Some(reply)` sends `reply` back as one message; `None` sends
/// nothing (for example after a notification).
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: Vec<u8>) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

impl<F, Fut> MessageHandler for F
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Vec<u8>>> + Send,
{
    fn handle(&self, message: Vec<u8>) -> impl Future<Output = Option<Vec<u8>>> + Send {
        self(message)
    }
}

/// Serve one connection until it ends.
///
/// The loop stops at the first failed `next` (including a peer close) or the
/// first failed `write`. The connection is then closed and the normalized close
/// result is returned, so `Ok(())` means the session ended cleanly.
///
/// # Example
///
/// ```no_run
/// use json_rpc_ws::NativeConnAdapter;
/// use json_rpc_ws::session::serve;
/// use json_rpc_ws::transports::InMemory;
///
/// # async fn demo() -> Result<(), json_rpc_ws::Error> {
/// let (transport, _peer) = InMemory::pair();
/// let conn = NativeConnAdapter::new(transport);
///
/// let echo = |message: Vec<u8>| async move { Some(message) };
/// serve(&conn, &echo).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve<C, H>(conn: &C, handler: &H) -> Result<(), Error>
where
    C: NativeConn,
    H: MessageHandler,
{
    loop {
        let message = match conn.next().await {
            Ok(message) => message,
            Err(e) => {
                debug!("Connection ended: {}", e);
                break;
            }
        };

        debug!("Received message of {} bytes", message.len());

        if let Some(reply) = handler.handle(message).await
            && let Err(e) = conn.write(&reply).await
        {
            warn!("Failed to write reply: {}", e);
            break;
        }
    }

    match conn.close().await {
        Ok(()) => {
            debug!("Connection closed cleanly");
            Ok(())
        }
        Err(e) => {
            debug!("Connection closed with error: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeConnAdapter;
    use crate::close::CloseCode;
    use crate::transports::{FrameKind, InMemory, Transport};

    #[tokio::test]
    async fn echoes_until_peer_goes_away() {
        let (local, peer) = InMemory::pair();
        let conn = NativeConnAdapter::new(local);
        let echo = |message: Vec<u8>| async move { Some(message) };

        let server = async { serve(&conn, &echo).await };
        let client = async {
            peer.write_frame(FrameKind::Text, b"{\"id\":1}").await.unwrap();
            let (_, reply) = peer.read_frame().await.unwrap();
            assert_eq!(reply, b"{\"id\":1}");
            peer.close_with(CloseCode::GOING_AWAY).await.unwrap();
        };

        let (result, ()) = tokio::join!(server, client);
        assert!(result.is_ok());
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn handler_returning_none_sends_nothing() {
        let (local, peer) = InMemory::pair();
        let conn = NativeConnAdapter::new(local);
        let silent = |_message: Vec<u8>| async move { None::<Vec<u8>> };

        let server = async { serve(&conn, &silent).await };
        let client = async {
            peer.write_frame(FrameKind::Text, b"{\"method\":\"notify\"}")
                .await
                .unwrap();
            peer.close_with(CloseCode::NORMAL_CLOSURE).await.unwrap();
            // Only the close has to come back
            peer.read_frame().await
        };

        let (result, next) = tokio::join!(server, client);
        assert!(result.is_ok());
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn abnormal_peer_close_is_reported() {
        let (local, peer) = InMemory::pair();
        let conn = NativeConnAdapter::new(local);
        let echo = |message: Vec<u8>| async move { Some(message) };

        peer.close_with(CloseCode::POLICY_VIOLATION).await.unwrap();

        let err = serve(&conn, &echo).await.unwrap_err();
        assert!(matches!(err, Error::CloseError(_)));
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));
    }
}

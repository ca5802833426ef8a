//! In-memory transport for WebSocket-style connections.
//!
//! This module implements an in-memory [`Transport`] that behaves like one end
//! of a WebSocket session within the same process. It uses async channels for
//! frame passing and is primarily useful for testing the connection adapter and
//! message handlers without a network socket.

use std::sync::OnceLock;

use tokio::sync::{Mutex, mpsc};

use crate::close::CloseCode;
use crate::transports::{FrameKind, Transport, TransportError};

/// Capacity of each direction of an in-memory pair.
const CHANNEL_CAPACITY: usize = 128;

#[derive(Debug)]
enum Envelope {
    Data(FrameKind, Vec<u8>),
    Close(CloseCode),
}

/// In-memory transport for WebSocket frames.
///
/// Frames written on one end of a [`pair`](InMemory::pair) are read, in order,
/// on the other end. Closing one end delivers a close frame carrying a close
/// code, which the other end reports from its next read.
///
/// # Example
///
/// ```no_run
/// use json_rpc_ws::transports::{FrameKind, InMemory, Transport};
///
/// # async fn demo() -> Result<(), json_rpc_ws::transports::TransportError> {
/// let (local, remote) = InMemory::pair();
///
/// local.write_frame(FrameKind::Text, b"{\"jsonrpc\":\"2.0\"}").await?;
/// let (kind, payload) = remote.read_frame().await?;
/// assert_eq!(kind, FrameKind::Text);
/// assert_eq!(payload, b"{\"jsonrpc\":\"2.0\"}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemory {
    receiver: Mutex<mpsc::Receiver<Envelope>>,
    sender: mpsc::Sender<Envelope>,
    peer_close: OnceLock<CloseCode>,
    local_close: OnceLock<CloseCode>,
}

impl InMemory {
    fn new(receiver: mpsc::Receiver<Envelope>, sender: mpsc::Sender<Envelope>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            sender,
            peer_close: OnceLock::new(),
            local_close: OnceLock::new(),
        }
    }

    /// Create a pair of connected in-memory transports.
    ///
    /// Frames sent on `a` are received by `b`, and vice versa.
    pub fn pair() -> (Self, Self) {
        let (sender_a, receiver_a) = mpsc::channel(CHANNEL_CAPACITY);
        let (sender_b, receiver_b) = mpsc::channel(CHANNEL_CAPACITY);

        let a = Self::new(receiver_b, sender_a);
        let b = Self::new(receiver_a, sender_b);

        (a, b)
    }

    /// Send a close frame with the given code to the other end.
    ///
    /// This is how a test plays a peer that ends the session with a specific
    /// code. Only the first close of an end sends a frame.
    pub async fn close_with(&self, code: CloseCode) -> Result<(), TransportError> {
        if self.local_close.set(code).is_err() {
            return Ok(());
        }

        self.sender.send(Envelope::Close(code)).await.map_err(|_| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Receiver disconnected",
            ))
        })
    }

    /// Pick up a close frame the peer queued before this end read it.
    ///
    /// Data frames queued ahead of it are dropped.
    async fn take_queued_close(&self) {
        let mut receiver = self.receiver.lock().await;
        while let Ok(envelope) = receiver.try_recv() {
            if let Envelope::Close(code) = envelope {
                let _ = self.peer_close.set(code);
                break;
            }
        }
    }

    /// Close code of the session end, if either side has closed.
    fn ended_with(&self) -> Option<CloseCode> {
        self.peer_close
            .get()
            .or_else(|| self.local_close.get())
            .copied()
    }
}

impl Transport for InMemory {
    async fn write_frame(&self, kind: FrameKind, payload: &[u8]) -> Result<(), TransportError> {
        if let Some(code) = self.ended_with() {
            return Err(TransportError::closed(code));
        }

        if kind == FrameKind::Text {
            std::str::from_utf8(payload)?;
        }

        self.sender
            .send(Envelope::Data(kind, payload.to_vec()))
            .await
            .map_err(|_| {
                TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "Receiver disconnected",
                ))
            })
    }

    async fn read_frame(&self) -> Result<(FrameKind, Vec<u8>), TransportError> {
        if let Some(code) = self.peer_close.get() {
            return Err(TransportError::closed(*code));
        }

        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(Envelope::Data(kind, payload)) => Ok((kind, payload)),
            Some(Envelope::Close(code)) => {
                let _ = self.peer_close.set(code);
                Err(TransportError::closed(code))
            }
            None => {
                // Other end dropped without a close frame
                let _ = self.peer_close.set(CloseCode::ABNORMAL_CLOSURE);
                Err(TransportError::closed(CloseCode::ABNORMAL_CLOSURE))
            }
        }
    }

    /// Close this end.
    ///
    /// A close frame already queued by the peer wins over a local normal
    /// closure. Waits for an in-progress `read_frame` to release the receiver.
    async fn close(&self) -> Result<(), TransportError> {
        if self.ended_with().is_none() {
            self.take_queued_close().await;
        }

        if let Some(code) = self.peer_close.get().copied() {
            // Echo the peer's close frame; a peer that already hung up misses nothing
            if self.local_close.set(code).is_ok() {
                let _ = self.sender.send(Envelope::Close(code)).await;
            }
            return Err(TransportError::closed(code));
        }

        if let Some(code) = self.local_close.get() {
            return Err(TransportError::closed(*code));
        }

        self.close_with(CloseCode::NORMAL_CLOSURE).await?;
        Err(TransportError::closed(CloseCode::NORMAL_CLOSURE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_order_with_kind() {
        let (a, b) = InMemory::pair();

        a.write_frame(FrameKind::Text, b"first").await.unwrap();
        a.write_frame(FrameKind::Binary, &[0, 159, 146, 150]).await.unwrap();

        assert_eq!(b.read_frame().await.unwrap(), (FrameKind::Text, b"first".to_vec()));
        assert_eq!(
            b.read_frame().await.unwrap(),
            (FrameKind::Binary, vec![0, 159, 146, 150])
        );
    }

    #[tokio::test]
    async fn text_frame_rejects_invalid_utf8() {
        let (a, _b) = InMemory::pair();

        let err = a.write_frame(FrameKind::Text, &[0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidText(_)));
    }

    #[tokio::test]
    async fn peer_close_code_is_reported_on_read_and_close() {
        let (a, b) = InMemory::pair();

        b.close_with(CloseCode::POLICY_VIOLATION).await.unwrap();

        let err = a.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));

        // Reads after the close frame keep failing instead of waiting forever
        let err = a.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));

        let err = a.close().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));

        // The close frame is echoed back to complete the handshake
        let err = b.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));
    }

    #[tokio::test]
    async fn close_picks_up_a_queued_peer_close() {
        let (a, b) = InMemory::pair();

        b.write_frame(FrameKind::Text, b"{}").await.unwrap();
        b.close_with(CloseCode::POLICY_VIOLATION).await.unwrap();

        let err = a.close().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));

        // The peer gets its own code back, not a normal closure
        let err = b.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::POLICY_VIOLATION));
    }

    #[tokio::test]
    async fn local_close_sends_normal_closure() {
        let (a, b) = InMemory::pair();

        let err = a.close().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::NORMAL_CLOSURE));

        let err = b.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::NORMAL_CLOSURE));

        let err = a.write_frame(FrameKind::Text, b"late").await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::NORMAL_CLOSURE));
    }

    #[tokio::test]
    async fn dropped_peer_reads_as_abnormal_closure() {
        let (a, b) = InMemory::pair();
        drop(b);

        let err = a.read_frame().await.unwrap_err();
        assert_eq!(err.close_code(), Some(CloseCode::ABNORMAL_CLOSURE));
    }
}

//! WebSocket transport backed by axum.
//!
//! This module wraps an upgraded [`axum::extract::ws::WebSocket`] in a
//! [`Transport`]. The socket is split into its sink and stream halves so a
//! pending read never holds up a write or a close.

use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::trace;

use crate::close::CloseCode;
use crate::transports::{FrameKind, Transport, TransportError};

/// How long a locally initiated close waits for the peer's close frame.
pub const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket transport for one upgraded connection.
///
/// Frame writes are serialized behind a mutex on the sink half, so concurrent
/// writers cannot interleave the pieces of two messages.
pub struct WsTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
    peer_close: OnceLock<CloseCode>,
    local_close: OnceLock<CloseCode>,
}

impl WsTransport {
    /// Create a new transport from an upgraded socket.
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            peer_close: OnceLock::new(),
            local_close: OnceLock::new(),
        }
    }

    /// Record the code of a close frame received from the peer.
    fn record_peer_close(&self, frame: Option<CloseFrame>) -> (CloseCode, String) {
        let (code, reason) = match frame {
            Some(frame) => (CloseCode(frame.code), frame.reason.as_str().to_owned()),
            None => (CloseCode::NO_STATUS_RECEIVED, String::new()),
        };
        trace!("Peer sent close frame: {}", code);
        let _ = self.peer_close.set(code);
        (code, reason)
    }

    /// Read until the peer's close frame arrives.
    ///
    /// Data frames still in flight are dropped. Returns `None` if the stream
    /// fails before the peer answers.
    async fn await_peer_close(&self) -> Option<CloseCode> {
        let mut stream = self.stream.lock().await;
        if let Some(code) = self.peer_close.get() {
            return Some(*code);
        }

        loop {
            match stream.next().await {
                Some(Ok(Message::Close(frame))) => return Some(self.record_peer_close(frame).0),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    trace!("Connection failed during closing handshake: {}", e);
                    return None;
                }
                None => {
                    let _ = self.peer_close.set(CloseCode::ABNORMAL_CLOSURE);
                    return Some(CloseCode::ABNORMAL_CLOSURE);
                }
            }
        }
    }
}

impl Transport for WsTransport {
    /// Send one message and flush it.
    ///
    /// Feeding the sink opens and fills the frame; the flush finalizes it.
    async fn write_frame(&self, kind: FrameKind, payload: &[u8]) -> Result<(), TransportError> {
        let message = match kind {
            FrameKind::Text => Message::Text(std::str::from_utf8(payload)?.to_owned().into()),
            FrameKind::Binary => Message::Binary(payload.to_vec().into()),
        };

        let mut sink = self.sink.lock().await;
        sink.feed(message).await.map_err(TransportError::websocket)?;
        sink.flush().await.map_err(TransportError::websocket)
    }

    async fn read_frame(&self) -> Result<(FrameKind, Vec<u8>), TransportError> {
        if let Some(code) = self.peer_close.get() {
            return Err(TransportError::closed(*code));
        }

        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok((FrameKind::Text, text.as_str().as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok((FrameKind::Binary, data.to_vec()));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Pongs are queued by the socket itself
                    continue;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = self.record_peer_close(frame);
                    return Err(TransportError::Closed { code, reason });
                }
                Some(Err(e)) => return Err(TransportError::websocket(e)),
                None => {
                    let _ = self.peer_close.set(CloseCode::ABNORMAL_CLOSURE);
                    return Err(TransportError::closed(CloseCode::ABNORMAL_CLOSURE));
                }
            }
        }
    }

    /// Run the local side of the closing handshake.
    ///
    /// If the peer already closed, its code is the outcome and the pending
    /// close reply is flushed. Otherwise a normal-closure frame is sent and
    /// the outcome is the code the peer answers with, which may be a close
    /// frame it sent before reading ours. A peer that stays silent for
    /// [`CLOSE_HANDSHAKE_TIMEOUT`] leaves the normal-closure outcome.
    async fn close(&self) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;

        if let Some(code) = self.peer_close.get().or_else(|| self.local_close.get()) {
            let code = *code;
            if self.local_close.set(code).is_ok()
                && let Err(e) = sink.close().await
            {
                trace!("Flushing close reply failed: {}", e);
            }
            return Err(TransportError::closed(code));
        }

        let _ = self.local_close.set(CloseCode::NORMAL_CLOSURE);
        let frame = CloseFrame {
            code: CloseCode::NORMAL_CLOSURE.as_u16(),
            reason: Utf8Bytes::from_static(""),
        };
        sink.send(Message::Close(Some(frame)))
            .await
            .map_err(TransportError::websocket)?;
        drop(sink);

        let code = match timeout(CLOSE_HANDSHAKE_TIMEOUT, self.await_peer_close()).await {
            Ok(Some(code)) => code,
            Ok(None) => CloseCode::NORMAL_CLOSURE,
            Err(_) => {
                trace!("Peer did not answer the close frame");
                CloseCode::NORMAL_CLOSURE
            }
        };
        Err(TransportError::closed(code))
    }
}

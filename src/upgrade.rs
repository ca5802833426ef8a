//! HTTP-to-WebSocket upgrade.
//!
//! This module turns an inbound axum [`Request`] into a [`NativeConnAdapter`].
//! The handshake itself is axum's [`WebSocketUpgrade`]; the [`Upgrader`] adds
//! the buffer sizing and origin policy, and maps a rejected handshake to an
//! [`UpgradeError`].
//!
//! Because the HTTP server only hands over the raw connection after the
//! `101 Switching Protocols` response has been sent, a successful upgrade
//! returns that response and delivers the adapter to a callback.

use std::fmt;
use std::future::Future;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{FromRequestParts, Request};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::request::Parts;
use tracing::warn;

use crate::conn::NativeConnAdapter;
use crate::transports::WsTransport;

/// Default read buffer size in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default write buffer size in bytes.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024;

/// Origin policy applied to the upgrade request.
///
/// Returns `true` to allow the upgrade.
pub type OriginCheck = fn(&Parts) -> bool;

/// Origin policy that accepts every origin.
///
/// Origin restrictions, when needed, belong to the HTTP layer in front of the
/// upgrade endpoint.
pub fn accept_any_origin(_request: &Parts) -> bool {
    true
}

/// Upgrade configuration used by [`new_conn`].
pub static DEFAULT_UPGRADER: Upgrader = Upgrader::new();

/// Errors raised while upgrading an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// The request is not a valid WebSocket upgrade request.
    #[error("Invalid upgrade request: {0}")]
    Handshake(#[from] WebSocketUpgradeRejection),

    /// The origin policy refused the request.
    #[error("Origin not allowed")]
    OriginRejected,
}

impl IntoResponse for UpgradeError {
    /// The response the failed handshake produces.
    fn into_response(self) -> Response {
        match self {
            Self::Handshake(rejection) => rejection.into_response(),
            Self::OriginRejected => (StatusCode::FORBIDDEN, "Origin not allowed").into_response(),
        }
    }
}

/// WebSocket upgrade configuration.
///
/// # Example
///
/// ```no_run
/// use json_rpc_ws::upgrade::Upgrader;
///
/// let upgrader = Upgrader::new()
///     .with_read_buffer_size(4096)
///     .with_origin_check(|request| request.headers.contains_key("origin"));
/// ```
#[derive(Clone, Copy)]
pub struct Upgrader {
    read_buffer_size: usize,
    write_buffer_size: usize,
    check_origin: OriginCheck,
}

impl Upgrader {
    /// Create an upgrader with 1024-byte buffers that accepts every origin.
    pub const fn new() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            check_origin: accept_any_origin,
        }
    }

    /// Set the read buffer size.
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the write buffer size.
    pub const fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Set the origin policy.
    pub const fn with_origin_check(mut self, check: OriginCheck) -> Self {
        self.check_origin = check;
        self
    }

    /// Get the read buffer size.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// Get the write buffer size.
    pub fn write_buffer_size(&self) -> usize {
        self.write_buffer_size
    }

    /// Upgrade `request` to a WebSocket connection.
    ///
    /// On success, returns the handshake response for the HTTP server to send.
    /// Once the server completes the upgrade, `on_conn` runs with the new
    /// adapter. On failure no adapter is created and the error converts into
    /// the response the failed handshake produced. Exactly one attempt is made.
    ///
    /// If the HTTP server fails to hand over the connection after the
    /// handshake response was sent, `on_conn` never runs and the failure is
    /// logged.
    pub async fn upgrade<F, Fut>(&self, request: Request, on_conn: F) -> Result<Response, UpgradeError>
    where
        F: FnOnce(NativeConnAdapter<WsTransport>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (mut parts, _body) = request.into_parts();
        let upgrade = WebSocketUpgrade::from_request_parts(&mut parts, &()).await?;

        if !(self.check_origin)(&parts) {
            return Err(UpgradeError::OriginRejected);
        }

        let response = upgrade
            .read_buffer_size(self.read_buffer_size)
            .write_buffer_size(self.write_buffer_size)
            .on_failed_upgrade(|e: axum::Error| {
                warn!("WebSocket upgrade failed after handshake: {}", e);
            })
            .on_upgrade(move |socket| on_conn(NativeConnAdapter::new(WsTransport::new(socket))));

        Ok(response)
    }
}

impl Default for Upgrader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Upgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upgrader")
            .field("read_buffer_size", &self.read_buffer_size)
            .field("write_buffer_size", &self.write_buffer_size)
            .finish_non_exhaustive()
    }
}

/// Upgrade `request` with [`DEFAULT_UPGRADER`].
///
/// # Example
///
/// ```no_run
/// use axum::extract::Request;
/// use axum::response::{IntoResponse, Response};
/// use json_rpc_ws::{NativeConn, upgrade};
///
/// async fn ws(request: Request) -> Response {
///     let upgraded = upgrade::new_conn(request, |conn| async move {
///         while let Ok(message) = conn.next().await {
///             if conn.write(&message).await.is_err() {
///                 break;
///             }
///         }
///         let _ = conn.close().await;
///     });
///
///     match upgraded.await {
///         Ok(response) => response,
///         Err(e) => e.into_response(),
///     }
/// }
/// ```
pub async fn new_conn<F, Fut>(request: Request, on_conn: F) -> Result<Response, UpgradeError>
where
    F: FnOnce(NativeConnAdapter<WsTransport>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    DEFAULT_UPGRADER.upgrade(request, on_conn).await
}

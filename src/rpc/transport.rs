//! WebSocket Transport Layer
//!
//! Single responsibility: carry binary frames over a pinned-TLS WebSocket.
//! No knowledge of the request schema, authentication, or session management.
//!
//! [`FrameTransport`] is the seam the session is written against; [`WsTransport`]
//! is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio_tungstenite::{
    connect_async_tls_with_config,
    tungstenite::{client::IntoClientRequest, protocol::Message, Error as WsError},
    Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

use super::trust;
use crate::error::ClientError;

/// Type alias for the WebSocket send half
pub type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, Message>;

/// Type alias for the WebSocket receive half
pub type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// A duplex channel of discrete binary frames.
///
/// One call to `send_frame` is one message on the wire; one call to
/// `recv_frame` yields one message, or `None` once the peer has closed.
#[async_trait]
pub trait FrameTransport: Send + 'static {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), ClientError>;

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, ClientError>;

    async fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// A connected, TLS-protected WebSocket.
///
/// It can only be constructed via `WsTransport::connect()`.
pub struct WsTransport {
    sink: WsSink,
    stream: WsStream,
}

impl WsTransport {
    /// Connect to `url`, trusting only the pinned certificate chain.
    ///
    /// The whole TCP + TLS + upgrade sequence is bounded by `handshake_timeout`.
    pub async fn connect(url: &Url, handshake_timeout: Duration) -> Result<Self, ClientError> {
        debug!(url = %url, "Connecting to WebSocket");

        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::AddressParse(format!("Failed to build request: {}", e)))?;
        let connector = Connector::Rustls(trust::pinned_client_config()?);

        let (ws, _) = tokio::time::timeout(
            handshake_timeout,
            connect_async_tls_with_config(request, None, false, Some(connector)),
        )
        .await
        .map_err(|_| {
            ClientError::Handshake(format!(
                "Connect timed out after {}s",
                handshake_timeout.as_secs()
            ))
        })?
        .map_err(classify_connect_error)?;

        let (sink, stream) = ws.split();

        debug!(url = %url, "WebSocket connected");
        Ok(Self { sink, stream })
    }
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), ClientError> {
        self.sink
            .send(Message::Binary(frame))
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to send: {}", e)))
    }

    /// Skips non-binary messages (ping/pong handled automatically).
    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Ping(_))) => {
                    // Pong is handled automatically by tungstenite
                    continue;
                }
                Some(Ok(_)) => continue, // Skip text, pong, frame messages
                Some(Err(e)) => {
                    return Err(ClientError::Transport(format!("WebSocket error: {}", e)))
                }
                None => return Ok(None), // Stream ended
            }
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.sink
            .close()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to close: {}", e)))
    }
}

/// Map a connect failure onto the error kinds callers distinguish.
///
/// Certificate failures surface from rustls either directly or wrapped in an
/// `io::Error` by tokio-rustls.
fn classify_connect_error(err: WsError) -> ClientError {
    match err {
        WsError::Tls(e) => ClientError::TlsTrust(e.to_string()),
        WsError::Url(e) => ClientError::AddressParse(e.to_string()),
        WsError::Io(e) => {
            let is_cert_error = e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<rustls::Error>())
                .map(|tls| {
                    matches!(
                        tls,
                        rustls::Error::InvalidCertificate(_) | rustls::Error::NoCertificatesPresented
                    )
                })
                .unwrap_or(false);
            if is_cert_error {
                ClientError::TlsTrust(e.to_string())
            } else {
                ClientError::Handshake(format!("WebSocket connect failed: {}", e))
            }
        }
        other => ClientError::Handshake(format!("WebSocket connect failed: {}", other)),
    }
}

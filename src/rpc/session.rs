//! Service Session
//!
//! Single responsibility: an authenticated connection and the single worker
//! that owns it.
//!
//! # The Key Abstraction
//!
//! A `Session` can ONLY be created via `Session::connect()` or
//! `Session::establish()`, both of which return only after sign-in
//! succeeded. If you have a `Session`, you have the account identity.
//!
//! # Request Flow
//!
//! ```text
//!  caller ──send()──► mpsc queue ──► worker task ──frame──► transport
//!     ▲                                  │
//!     └────────── oneshot reply ◄────────┘ (exactly one reply frame)
//! ```
//!
//! The worker handles one command at a time, so requests from all callers
//! interleave but never overlap on the wire. No lock is held across I/O.
//!
//! Sessions do NOT reconnect. After a transport failure the worker drops the
//! connection and answers every later request with `NotConnected`; build a
//! new session to continue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::auth::{self, Credentials};
use super::transport::{FrameTransport, WsTransport};
use crate::config::Config;
use crate::error::ClientError;
use crate::protocol::{Request, Response};

/// Settings that shape a session once connected.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service WebSocket URL
    pub endpoint: String,
    /// Bound on connect + TLS + upgrade
    pub handshake_timeout: Duration,
    /// Optional bound on each caller's wait; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Depth of the worker's command queue
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::from(&Config::default())
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            handshake_timeout: Duration::from_secs(config.handshake_timeout_secs),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            queue_capacity: config.queue_capacity.max(1),
        }
    }
}

enum Command {
    Call {
        request: Request,
        reply: oneshot::Sender<Result<Response, ClientError>>,
    },
    Disconnect {
        done: oneshot::Sender<()>,
    },
}

/// An authenticated session with the file service.
pub struct Session {
    config: SessionConfig,
    email: String,
    commands: mpsc::Sender<Command>,
    worker: tokio::task::JoinHandle<()>,
    /// Cleared by the worker when it drops the connection
    connected: Arc<AtomicBool>,
}

impl Session {
    /// Dial the configured endpoint and sign in.
    ///
    /// # Errors
    /// - `AddressParse` if the endpoint is not a `wss://` URL
    /// - `Decode` if the token is not valid base64 (checked before dialing)
    /// - `TlsTrust` if the server does not chain to the pinned root
    /// - `Handshake` on connect timeout, transport failure, or rejected sign-in
    /// - `Protocol` / `EmptyResponse` if the sign-in reply is malformed
    pub async fn connect(config: SessionConfig, credentials: &Credentials) -> Result<Self, ClientError> {
        info!(endpoint = %config.endpoint, "Establishing session");

        let url = crate::config::parse_endpoint(&config.endpoint)?;
        let token = credentials.token_bytes()?;

        let transport = WsTransport::connect(&url, config.handshake_timeout).await?;
        Self::sign_in_over(transport, token, credentials.pin(), config).await
    }

    /// Sign in over an already-connected transport.
    pub async fn establish<T: FrameTransport>(
        transport: T,
        credentials: &Credentials,
        config: SessionConfig,
    ) -> Result<Self, ClientError> {
        let token = credentials.token_bytes()?;
        Self::sign_in_over(transport, token, credentials.pin(), config).await
    }

    async fn sign_in_over<T: FrameTransport>(
        mut transport: T,
        token: Vec<u8>,
        pin: &str,
        config: SessionConfig,
    ) -> Result<Self, ClientError> {
        let email = auth::sign_in(&mut transport, token, pin).await?;

        let (commands, rx) = mpsc::channel(config.queue_capacity.max(1));
        let connected = Arc::new(AtomicBool::new(true));
        let worker = tokio::spawn(
            Worker::new(Box::new(transport), rx, Arc::clone(&connected)).run(),
        );

        info!(endpoint = %config.endpoint, email = %email, "Session established");

        Ok(Self {
            config,
            email,
            commands,
            worker,
            connected,
        })
    }

    /// Send one request and wait for its one reply.
    ///
    /// # Errors
    /// - `NotConnected` if the connection is gone (nothing is written)
    /// - `Transport` if the write or read fails; the connection is then dropped
    /// - `Protocol` if the reply frame does not decode
    /// - `EmptyResponse` if the reply carries no operation
    /// - `Timeout` if `request_timeout` is set and elapses
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let operation = request.operation_name();
        let (reply, response_rx) = oneshot::channel();

        self.commands
            .send(Command::Call { request, reply })
            .await
            .map_err(|_| ClientError::NotConnected)?;

        let outcome = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, response_rx)
                .await
                .map_err(|_| ClientError::Timeout(format!("{} after {:?}", operation, limit)))?,
            None => response_rx.await,
        };

        // A dropped reply means the worker is gone.
        outcome.map_err(|_| ClientError::NotConnected)?
    }

    /// Close the connection. Later requests fail with `NotConnected`.
    pub async fn disconnect(&self) {
        let (done, done_rx) = oneshot::channel();
        if self.commands.send(Command::Disconnect { done }).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Account identity returned at sign-in.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// False once the connection is gone: after `disconnect()`, a transport
    /// failure, or the worker exiting. A dead session never comes back.
    pub fn is_alive(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.worker.is_finished()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.worker.abort();
        debug!("Session dropped, worker task aborted");
    }
}

/// Sole owner of the connection.
struct Worker {
    transport: Option<Box<dyn FrameTransport>>,
    commands: mpsc::Receiver<Command>,
    connected: Arc<AtomicBool>,
}

impl Worker {
    fn new(
        transport: Box<dyn FrameTransport>,
        commands: mpsc::Receiver<Command>,
        connected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport: Some(transport),
            commands,
            connected,
        }
    }

    fn drop_transport(&mut self) -> Option<Box<dyn FrameTransport>> {
        self.connected.store(false, Ordering::Release);
        self.transport.take()
    }

    async fn run(mut self) {
        debug!("Session worker started");

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Call { request, reply } => {
                    // Caller gave up while the request was queued; never write it.
                    if reply.is_closed() {
                        debug!(operation = request.operation_name(), "Skipping abandoned request");
                        continue;
                    }
                    let result = self.round_trip(request).await;
                    // Caller may have timed out; the reply is simply discarded.
                    let _ = reply.send(result);
                }
                Command::Disconnect { done } => {
                    if let Some(mut transport) = self.drop_transport() {
                        if let Err(e) = transport.close().await {
                            debug!(error = %e, "Close failed");
                        }
                        info!("Session disconnected");
                    }
                    let _ = done.send(());
                }
            }
        }

        self.connected.store(false, Ordering::Release);
        debug!("Session worker ended");
    }

    async fn round_trip(&mut self, request: Request) -> Result<Response, ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::NotConnected)?;
        let operation = request.operation_name();

        debug!(operation = operation, "Sending request");

        match exchange(transport.as_mut(), request.to_frame()).await {
            Ok(frame) => Response::from_frame(&frame),
            Err(e) => {
                warn!(operation = operation, error = %e, "Transport failed, dropping connection");
                self.drop_transport();
                Err(e)
            }
        }
    }
}

/// Write one frame, read exactly one frame back.
async fn exchange(transport: &mut dyn FrameTransport, frame: Vec<u8>) -> Result<Vec<u8>, ClientError> {
    transport.send_frame(frame).await?;
    transport
        .recv_frame()
        .await?
        .ok_or_else(|| ClientError::Transport("Connection closed by server".into()))
}

//! Sign-in Handshake
//!
//! Single responsibility: turn caller-supplied credentials into an
//! authenticated identity on a freshly connected transport.
//!
//! # Authentication Flow
//!
//! 1. Decode the base64 token into the opaque credential bytes
//! 2. Send one `SignIn { data, pin }` frame
//! 3. Read exactly one reply frame
//! 4. Accept only a `SignIn` reply with `Status::Success`; keep its email
//!
//! Anything else (transport failure, wrong operation, non-success status)
//! means no session.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, warn};

use super::transport::FrameTransport;
use crate::error::ClientError;
use crate::protocol::{check_status, request, response, Request, Response, SignIn};

/// Token and pin as supplied by the caller.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    pin: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            pin: pin.into(),
        }
    }

    /// Decode the base64 token into the opaque credential bytes.
    pub fn token_bytes(&self) -> Result<Vec<u8>, ClientError> {
        STANDARD
            .decode(self.token.trim())
            .map_err(|e| ClientError::Decode(format!("Failed to decode token: {}", e)))
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("pin", &"<redacted>")
            .finish()
    }
}

/// Run the sign-in exchange and return the server-declared account email.
///
/// `token` is the already-decoded credential blob.
pub async fn sign_in<T: FrameTransport + ?Sized>(
    transport: &mut T,
    token: Vec<u8>,
    pin: &str,
) -> Result<String, ClientError> {
    debug!("Sending sign-in");

    let request = Request::new(request::Operation::SignIn(SignIn {
        data: token,
        pin: Some(pin.to_string()),
    }));

    transport
        .send_frame(request.to_frame())
        .await
        .map_err(|e| ClientError::Handshake(format!("Sign-in send failed: {}", e)))?;

    let frame = transport
        .recv_frame()
        .await
        .map_err(|e| ClientError::Handshake(format!("Sign-in reply failed: {}", e)))?
        .ok_or_else(|| ClientError::Handshake("Connection closed during sign-in".into()))?;

    let reply = Response::from_frame(&frame)?;

    match reply.operation {
        Some(response::Operation::SignIn(result)) => {
            if let Err(e) = check_status("sign_in", result.status, result.message.as_deref()) {
                warn!(error = %e, "Sign-in rejected");
                return Err(ClientError::Handshake(e.to_string()));
            }
            info!(email = %result.email, "Signed in");
            Ok(result.email)
        }
        Some(other) => Err(ClientError::Protocol(format!(
            "Expected sign_in reply, got {}",
            other.name()
        ))),
        None => Err(ClientError::EmptyResponse),
    }
}

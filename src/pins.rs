//! Access-token (secondary pin) operations.
//!
//! Pin management requests must echo the session's account email, which is
//! why these live on top of an authenticated [`Session`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use crate::error::ClientError;
use crate::protocol::{
    check_status, request, response, unexpected, AddPin, AllowedPinOp, DeletePin, Request,
    UpdatePinOps,
};
use crate::rpc::Session;

/// Parameters for a new secondary pin.
#[derive(Debug, Clone, Default)]
pub struct NewPin {
    /// Unique name of the pin
    pub label: String,
    /// Six-digit pin
    pub pin: String,
    /// Seconds the pin stays valid from creation (unset = server default)
    pub expiry: Option<u64>,
    pub allowed_ops: Vec<AllowedPinOp>,
    pub allowed_objects: Vec<Vec<u8>>,
}

/// Material returned by the server for a new pin, base64-encoded for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub label: String,
    /// Secret that must accompany the pin to authenticate
    pub token: String,
    pub id_sent_to_client: String,
}

impl AccessToken {
    fn token_bytes(&self) -> Result<Vec<u8>, ClientError> {
        decode_field("token", &self.token)
    }

    fn id_bytes(&self) -> Result<Vec<u8>, ClientError> {
        decode_field("id_sent_to_client", &self.id_sent_to_client)
    }
}

pub struct Pins<'a> {
    session: &'a Session,
}

impl<'a> Pins<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn add(&self, new_pin: NewPin) -> Result<AccessToken, ClientError> {
        let request = Request::new(request::Operation::AddPin(AddPin {
            email: self.session.email().to_string(),
            pin: new_pin.pin,
            allowed_ops: op_codes(&new_pin.allowed_ops),
            name: Some(new_pin.label.clone()),
            ttl: new_pin.expiry.unwrap_or(0),
            allowed_objects: new_pin.allowed_objects,
        }));

        let result = match self.session.send(request).await?.operation {
            Some(response::Operation::AddPin(result)) => result,
            other => return Err(unexpected("add_pin", other)),
        };
        check_status("add_pin", result.status, result.message.as_deref())?;

        info!(label = %new_pin.label, "Pin added");
        Ok(AccessToken {
            label: new_pin.label,
            token: STANDARD.encode(&result.data),
            id_sent_to_client: STANDARD.encode(&result.id_to_client),
        })
    }

    pub async fn delete(&self, token: &AccessToken) -> Result<(), ClientError> {
        let request = Request::new(request::Operation::DeletePin(DeletePin {
            email: self.session.email().to_string(),
            id_sent_to_client: token.id_bytes()?,
            data: token.token_bytes()?,
        }));

        match self.session.send(request).await?.operation {
            Some(response::Operation::DeletePin(result)) => result.check("delete_pin")?,
            other => return Err(unexpected("delete_pin", other)),
        }

        info!(label = %token.label, "Pin deleted");
        Ok(())
    }

    /// Replace the operations and objects the pin is allowed to touch.
    pub async fn update_ops(
        &self,
        token: &AccessToken,
        allowed_ops: &[AllowedPinOp],
        allowed_objects: Vec<Vec<u8>>,
    ) -> Result<(), ClientError> {
        let request = Request::new(request::Operation::UpdatePinOps(UpdatePinOps {
            email: self.session.email().to_string(),
            allowed_ops: op_codes(allowed_ops),
            allowed_objects,
            data: token.token_bytes()?,
            pin_name: token.label.clone(),
        }));

        match self.session.send(request).await?.operation {
            Some(response::Operation::UpdatePinOps(result)) => result.check("update_pin_ops")?,
            other => return Err(unexpected("update_pin_ops", other)),
        }

        info!(label = %token.label, ops = allowed_ops.len(), "Pin operations updated");
        Ok(())
    }
}

impl Session {
    pub fn pins(&self) -> Pins<'_> {
        Pins::new(self)
    }
}

fn op_codes(ops: &[AllowedPinOp]) -> Vec<i32> {
    ops.iter().map(|op| *op as i32).collect()
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, ClientError> {
    STANDARD
        .decode(value)
        .map_err(|e| ClientError::Decode(format!("Failed to decode {}: {}", field, e)))
}

//! Error types for ysafe-client

use thiserror::Error;

use crate::protocol::Status;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid service address: {0}")]
    AddressParse(String),

    #[error("TLS trust error: {0}")]
    TlsTrust(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Credential decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Empty response: server returned no operation")]
    EmptyResponse,

    #[error("Corrupt data in attribute '{attribute}': {reason}")]
    CorruptData { attribute: String, reason: String },

    #[error("Not connected")]
    NotConnected,

    #[error("{operation} rejected with status {status:?}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        operation: &'static str,
        status: Status,
        message: Option<String>,
    },

    #[error("Unexpected operation in response: expected {expected}, got {actual}")]
    UnexpectedOperation {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Folder already exists: {0}")]
    AlreadyExists(String),

    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

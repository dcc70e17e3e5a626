//! Configuration for ysafe-client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ClientError;

/// Production service endpoint
pub const DEFAULT_ENDPOINT: &str = "wss://files.ysafe.io:5577";

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ysafe")
        .join("config.toml")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service WebSocket URL (must be wss://)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Connect + TLS + upgrade timeout in seconds
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Per-request timeout in seconds (unset = wait for the reply)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Depth of the session's request queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            handshake_timeout_secs: default_handshake_timeout(),
            request_timeout_secs: None,
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClientError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed and validated endpoint
    pub fn endpoint_url(&self) -> Result<Url, ClientError> {
        parse_endpoint(&self.endpoint)
    }
}

/// Parse a service address. Only `wss://` URLs are accepted.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ClientError::AddressParse(format!("{}: {}", endpoint, e)))?;
    if url.scheme() != "wss" {
        return Err(ClientError::AddressParse(format!(
            "{}: scheme must be wss, got {}",
            endpoint,
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(ClientError::AddressParse(format!("{}: missing host", endpoint)));
    }
    Ok(url)
}

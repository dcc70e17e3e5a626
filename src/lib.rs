//! ysafe-client - session client for the ysafe file service
//!
//! ## Architecture
//!
//! - **Session**: one pinned-TLS WebSocket connection, signed in with a
//!   token + pin, owned by a single worker task. Each request is one binary
//!   frame answered by exactly one binary frame.
//! - **Policy codec**: folder policy attributes packed into the nested
//!   attribute blob of folder metadata.
//! - **Operations**: folder and access-token (pin) management on top of a
//!   session.
//!
//! ## Example
//!
//! ```ignore
//! use ysafe_client::{Config, Credentials, SessionConfig, SessionRegistry};
//!
//! let registry = SessionRegistry::new(SessionConfig::from(&Config::default()));
//! let session = registry.get_or_connect(&Credentials::new(token, pin)).await?;
//!
//! session.folders().create("proj_abc").await?;
//! let policy = session.folders().policy("proj_abc").await?;
//! ```

pub mod config;
pub mod error;
pub mod folders;
pub mod pins;
pub mod policy;
pub mod protocol;
pub mod rpc;

// Re-exports
pub use config::Config;
pub use error::{ClientError, Result};
pub use folders::Folders;
pub use pins::{AccessToken, NewPin, Pins};
pub use policy::{FolderPolicy, PolicyField};
pub use rpc::{Credentials, FrameTransport, Session, SessionConfig, SessionRegistry};

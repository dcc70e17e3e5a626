//! Service Connection Module
//!
//! # Architecture
//!
//! The module is organized by concern, with each submodule having a single responsibility:
//!
//! | Module      | Responsibility                                      |
//! |-------------|-----------------------------------------------------|
//! | `trust`     | Pinned certificate chain and rustls config          |
//! | `transport` | WebSocket connect/send/receive of binary frames     |
//! | `auth`      | Credentials and the sign-in exchange                |
//! | `session`   | An authenticated connection owned by one worker     |
//! | `registry`  | One shared session per caller-owned registry        |
//!
//! # Usage
//!
//! ```ignore
//! use ysafe_client::rpc::{Credentials, SessionConfig, SessionRegistry};
//!
//! let registry = SessionRegistry::new(SessionConfig::default());
//! let session = registry
//!     .get_or_connect(&Credentials::new(token, pin))
//!     .await?;
//!
//! let response = session.send(request).await?;
//! ```
//!
//! "Connected" is a type you either have or don't have: `Session` only exists
//! after sign-in succeeded, and a session whose connection broke says so with
//! `NotConnected` instead of reconnecting behind the caller's back.

mod auth;
mod registry;
mod session;
mod transport;
pub mod trust;

pub use auth::{sign_in, Credentials};
pub use registry::SessionRegistry;
pub use session::{Session, SessionConfig};
pub use transport::{FrameTransport, WsTransport};

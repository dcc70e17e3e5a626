//! Session Registry
//!
//! Single responsibility: hand out one shared, live session per registry.
//!
//! The registry is owned by the composition root (for the CLI, `main`) and
//! passed to whoever needs a session. Configuration is idempotent within one
//! registry: the first successful `get_or_connect()` signs in, every later
//! call gets the same `Arc<Session>` without re-authenticating.
//!
//! A failed attempt leaves the registry empty so the next call tries again.
//! A registered session whose connection is gone (see [`Session::is_alive`])
//! is discarded on the next call and replaced by a freshly signed-in one.
//! Callers still holding the old `Arc` keep getting `NotConnected`.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::auth::Credentials;
use super::session::{Session, SessionConfig};
use crate::error::ClientError;

pub struct SessionRegistry {
    config: SessionConfig,
    /// Held across initialisation so concurrent callers wait for one sign-in
    session: Mutex<Option<Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Return the live session, connecting and signing in when there is none.
    pub async fn get_or_connect(&self, credentials: &Credentials) -> Result<Arc<Session>, ClientError> {
        self.get_or_init_with(|| Session::connect(self.config.clone(), credentials))
            .await
    }

    /// Like `get_or_connect`, with a caller-supplied session factory.
    ///
    /// `init` runs only when no live session is registered; concurrent
    /// callers wait for the first one.
    pub async fn get_or_init_with<F, Fut>(&self, init: F) -> Result<Arc<Session>, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session, ClientError>>,
    {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.as_ref().filter(|s| s.is_alive()) {
            debug!("Reusing registered session");
            return Ok(Arc::clone(session));
        }
        if slot.take().is_some() {
            info!("Registered session lost its connection, replacing it");
        }

        let session = Arc::new(init().await?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }
}

use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::session::driven_ports::TokenStore;
use crate::domain::task::TaskCache;
use anyhow::Context;
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

pub mod driven_ports {
    /// Somewhere the session token survives between runs, keyed under a single fixed name
    pub trait TokenStore {
        fn load(&self) -> Result<Option<String>, anyhow::Error>;
        fn save(&self, token: &str) -> Result<(), anyhow::Error>;
        fn remove(&self) -> Result<(), anyhow::Error>;
    }
}

/// Holds at most one opaque session token. Its presence decides whether tasks get fetched
/// and whether reminders get polled.
pub struct SessionHolder<S> {
    store: S,
    token: RwLock<Option<String>>,
}

impl<S: TokenStore> SessionHolder<S> {
    /// Creates a holder primed with whatever token was persisted by an earlier run
    pub fn new(store: S) -> Result<Self, anyhow::Error> {
        let token = store.load().context("loading the persisted session token")?;

        Ok(SessionHolder {
            store,
            token: RwLock::new(token),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Persists the token, then starts holding it
    pub fn set_token(&self, token: String) -> Result<(), anyhow::Error> {
        self.store
            .save(&token)
            .context("persisting the session token")?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);

        info!("Session started");
        Ok(())
    }

    /// Ends the session and drops every cached task. The in-memory session is always
    /// cleared, even if the persisted token can't be removed.
    pub fn clear(&self, cache: &TaskCache) -> Result<(), anyhow::Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        cache.clear();

        info!("Session cleared");
        self.store
            .remove()
            .context("removing the persisted session token")
    }

    /// Turns a driven port failure into a domain error, ending the session first if the
    /// API rejected the token. This applies no matter which operation failed.
    pub(super) fn settle_port_error(
        &self,
        port_err: DrivenPortError,
        action: &str,
        cache: &TaskCache,
    ) -> domain::Error {
        if let DrivenPortError::Unauthorized = port_err {
            warn!("Session token rejected while trying to {action}");
            if let Err(store_err) = self.clear(cache) {
                warn!("Could not forget the rejected token: {store_err:#}");
            }
        }

        port_err.into_error_trying_to(action)
    }
}

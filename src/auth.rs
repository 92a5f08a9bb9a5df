//! Authenticated session provider.
//!
//! Holds the signed-in identity (if any) and notifies subscribers whenever it
//! changes. Fetchers use it both to gate reads and as a re-fetch trigger.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::models::{Dashboard, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// A stored session is still being restored; callers should wait.
    pub restoring: bool,
}

#[derive(Clone)]
pub struct SessionProvider {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider {
    /// A provider with nobody signed in.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// A provider that is still restoring a stored session.
    pub fn restoring() -> Self {
        let (tx, _) = watch::channel(SessionState {
            identity: None,
            restoring: true,
        });
        Self { tx: Arc::new(tx) }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let provider = Self::new();
        provider.sign_in(identity);
        provider
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().identity.clone()
    }

    pub fn is_restoring(&self) -> bool {
        self.tx.borrow().restoring
    }

    pub fn sign_in(&self, identity: Identity) {
        info!(user = %identity.id, role = %identity.role, "signed in");
        self.tx.send_replace(SessionState {
            identity: Some(identity),
            restoring: false,
        });
    }

    /// Mark restoration finished without a session.
    pub fn finish_restoring(&self) {
        self.tx.send_if_modified(|state| std::mem::replace(&mut state.restoring, false));
    }

    pub fn sign_out(&self) {
        let previous = self.tx.send_replace(SessionState::default());
        if let Some(identity) = previous.identity {
            info!(user = %identity.id, "signed out");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Landing view for the current user.
    pub fn dashboard(&self) -> Option<Dashboard> {
        self.current().map(|identity| Dashboard::for_role(identity.role))
    }
}

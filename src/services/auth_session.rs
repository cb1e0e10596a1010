//! Authentication state channel.
//!
//! The sign-in flows themselves live with the auth provider; this type only
//! carries their outcome. Whoever completes a sign-in calls [`AuthSession::sign_in`],
//! and every subscriber (the bookmark manager, the REST client) observes it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::types::auth::{AuthState, Identity};

/// Cloneable handle to the current authentication state.
#[derive(Clone)]
pub struct AuthSession {
    sender: Arc<watch::Sender<AuthState>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Creates a session that starts signed out.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender: Arc::new(sender) }
    }

    pub fn sign_in(&self, identity: Identity) {
        info!(uid = %identity.uid, "auth state: signed in");
        self.sender.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        info!("auth state: signed out");
        self.sender.send_replace(None);
    }

    /// Marks the current identity's token as established, e.g. after a refresh.
    pub fn mark_token_ready(&self, token: &str) {
        self.sender.send_if_modified(|state| match state {
            Some(identity) => {
                identity.id_token = Some(token.to_string());
                identity.token_ready = true;
                true
            }
            None => false,
        });
    }

    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Subscribes to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }
}

use serde::{Deserialize, Serialize};

/// A signed-in user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user id; partition key for all bookmark records.
    pub uid: String,
    pub email: String,
    /// Bearer token for the remote document store, when the provider issued one.
    #[serde(default)]
    pub id_token: Option<String>,
    /// Set once the provider reports the token as fully established.
    #[serde(default)]
    pub token_ready: bool,
}

impl Identity {
    pub fn new(uid: &str, email: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token: None,
            token_ready: false,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.id_token = Some(token.to_string());
        self.token_ready = true;
        self
    }
}

/// Current authentication state: `None` when signed out.
pub type AuthState = Option<Identity>;

use crate::error::AuthError;
use crate::session::session::{Credential, CredentialProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub credential_provider: CredentialProvider,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.avatar_url.is_none()
    }
}

/// Session-change events: `Some` while a principal is signed in, `None` after sign-out.
pub type IdentityEvents = mpsc::UnboundedReceiver<Option<Identity>>;

/// Boundary to the third-party identity provider.
///
/// Every operation resolves with the updated identity or a provider error message.
/// Session changes are never returned to the caller directly: they arrive through
/// the receiver handed out by [`IdentityProvider::subscribe`], including the
/// restoration of an earlier session at startup. Dropping the receiver unsubscribes.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    fn subscribe(&self) -> IdentityEvents;

    /// Current bearer token, refreshed by the provider when needed. `None` when signed out.
    async fn id_token(&self) -> Result<Option<Credential>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in_federated(&self) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, AuthError>;
}

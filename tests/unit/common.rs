use artifact_tracker_client::config::{Config, IdentityConfig, RestApiConfig};
use artifact_tracker_client::error::AuthError;
use artifact_tracker_client::session::interface::{
    Identity, IdentityEvents, IdentityProvider, ProfileUpdate,
};
use artifact_tracker_client::session::session::{Credential, CredentialProvider};
use artifact_tracker_client::storage::config::CacheConfig;
use std::sync::Mutex;
use tokio::sync::mpsc;

pub fn config(base_url: &str, cache_path: &str) -> Config {
    Config {
        rest_api: RestApiConfig {
            base_url: base_url.to_string(),
            timeout: 5,
            like_timeout: 5,
        },
        identity: IdentityConfig::default(),
        cache: CacheConfig {
            path: cache_path.to_string(),
        },
    }
}

pub fn identity(email: &str) -> Identity {
    Identity {
        user_id: format!("uid-{email}"),
        email: email.to_string(),
        display_name: None,
        avatar_url: None,
        credential_provider: CredentialProvider::Password,
    }
}

pub fn bearer(email: &str) -> String {
    format!("Bearer token-uid-{email}")
}

/// Behaves like a hosted identity provider: every successful operation is
/// followed by a session-change event.
#[derive(Default)]
pub struct TestProvider {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
    current: Mutex<Option<Identity>>,
}

impl TestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, identity: Option<Identity>) {
        *self.current.lock().unwrap() = identity.clone();
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(identity.clone()).is_ok());
    }
}

#[async_trait::async_trait]
impl IdentityProvider for TestProvider {
    fn subscribe(&self) -> IdentityEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn id_token(&self) -> Result<Option<Credential>, AuthError> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .as_ref()
            .map(|identity| Credential::new(format!("token-{}", identity.user_id))))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if password != "secret" {
            return Err(AuthError::Provider("wrong password".to_string()));
        }
        let identity = identity(email);
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Identity, AuthError> {
        let identity = identity(email);
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_federated(&self) -> Result<Identity, AuthError> {
        let mut identity = identity("federated@museum.org");
        identity.credential_provider = CredentialProvider::Federated;
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.emit(None);
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, AuthError> {
        let mut identity = self
            .current
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::NoSession)?;
        if let Some(name) = &update.display_name {
            identity.display_name = Some(name.clone());
        }
        if let Some(avatar) = &update.avatar_url {
            identity.avatar_url = Some(avatar.clone());
        }
        self.emit(Some(identity.clone()));
        Ok(identity)
    }
}

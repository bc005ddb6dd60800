/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 17/10/26
 ******************************************************************************/
use anyhow::{bail, Context, Result};
use artifact_tracker_client::application::models::artifact::ArtifactId;
use artifact_tracker_client::application::services::like_registry::SyncStatus;
use artifact_tracker_client::client::TrackerClient;
use artifact_tracker_client::config::Config;
use artifact_tracker_client::error::AuthError;
use artifact_tracker_client::session::interface::{
    Identity, IdentityEvents, IdentityProvider, ProfileUpdate,
};
use artifact_tracker_client::session::session::{Credential, CredentialProvider};
use artifact_tracker_client::utils::logger::setup_logger;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Session restored from a token obtained elsewhere (e.g. copied from a browser).
struct StaticTokenProvider {
    identity: Identity,
    token: String,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
}

#[async_trait::async_trait]
impl IdentityProvider for StaticTokenProvider {
    fn subscribe(&self) -> IdentityEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Some(self.identity.clone()));
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    async fn id_token(&self) -> Result<Option<Credential>, AuthError> {
        Ok(Some(Credential::new(self.token.clone())))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Identity, AuthError> {
        Err(AuthError::Provider("static token provider cannot sign in".to_string()))
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Identity, AuthError> {
        Err(AuthError::Provider("static token provider cannot sign up".to_string()))
    }

    async fn sign_in_federated(&self) -> Result<Identity, AuthError> {
        Err(AuthError::Provider("static token provider cannot sign in".to_string()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<Identity, AuthError> {
        Ok(self.identity.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger();

    let token = std::env::var("ARTIFACTS_ID_TOKEN").context("ARTIFACTS_ID_TOKEN is not set")?;
    let email = std::env::var("ARTIFACTS_USER_EMAIL").context("ARTIFACTS_USER_EMAIL is not set")?;
    let user_id = std::env::var("ARTIFACTS_USER_ID").unwrap_or_else(|_| email.clone());
    let Some(artifact_id) = std::env::args().nth(1) else {
        bail!("usage: like_toggle <artifact-id>");
    };

    let config = Config::new();
    info!("Configuration: {}", config);

    let provider = Arc::new(StaticTokenProvider {
        identity: Identity {
            user_id,
            email,
            display_name: None,
            avatar_url: None,
            credential_provider: CredentialProvider::Password,
        },
        token,
        subscribers: Mutex::new(Vec::new()),
    });
    let client = TrackerClient::connect_with_file_cache(config, provider).await?;

    client.session().resolved().await;
    let mut sync = client.registry().watch_sync();
    let status = sync
        .wait_for(|s| s.generation > 0 && s.status != SyncStatus::Loading)
        .await
        .map(|s| s.status.clone())?;
    info!("Liked artifacts: {:?}", status);

    let artifact_id = ArtifactId::new(artifact_id);
    match client.get_artifact(&artifact_id).await {
        Ok(artifact) => info!(
            "{} has {} likes (liked by you: {})",
            artifact.name,
            artifact.likes,
            client.is_liked(&artifact_id)
        ),
        Err(e) => error!("Could not load artifact {}: {}", artifact_id, e),
    }

    match client.like_toggle(&artifact_id).await {
        Ok(outcome) => info!(
            "Artifact {} is now {} (likes: {:?})",
            outcome.artifact_id,
            if outcome.liked { "liked" } else { "not liked" },
            outcome.like_count
        ),
        Err(e) if e.requires_sign_in() => error!("Sign in first: {}", e),
        Err(e) => error!("Like toggle failed: {}", e),
    }

    Ok(())
}

/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 17/10/26
 ******************************************************************************/
use crate::application::models::artifact::{Artifact, ArtifactId, NewArtifact};
use crate::application::models::catalog::{CatalogPage, CatalogQuery};
use crate::application::models::like::LikeOutcome;
use crate::application::models::user::{RegistrationStatus, UserRegistration};
use crate::application::services::artifact_service::{ArtifactService, ArtifactServiceImpl};
use crate::application::services::like_reconciler::LikeReconciler;
use crate::application::services::like_registry::LikeRegistry;
use crate::config::Config;
use crate::error::{AppError, LikeError};
use crate::session::interface::IdentityProvider;
use crate::session::session::{Credential, Session};
use crate::session::store::{SessionStore, SessionSubscription};
use crate::storage::cache::{FileSnapshotCache, SnapshotCache};
use crate::transport::http_client::ArtifactHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Wired-up client: one session store, one like registry and one reconciler
/// shared by every view. Dropping it stops the background tasks.
pub struct TrackerClient {
    config: Config,
    store: Arc<SessionStore>,
    registry: Arc<LikeRegistry>,
    reconciler: LikeReconciler,
    artifacts: Arc<ArtifactServiceImpl>,
    identity_listener: JoinHandle<()>,
    _registry_sync: SessionSubscription,
}

impl TrackerClient {
    /// Builds the client and starts following the identity provider.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub async fn connect(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Result<Self> {
        let http = ArtifactHttpClient::new(&config.rest_api.base_url, config.rest_api.timeout)
            .context("Failed to create artifacts HTTP client")?;
        let artifacts = Arc::new(ArtifactServiceImpl::new(Arc::new(http)));

        let store = SessionStore::new(provider, cache, config.identity.clone()).await;
        let registry = LikeRegistry::new(store.clone(), artifacts.clone());
        let registry_sync = registry.attach();
        let identity_listener = store.spawn_listener();
        let reconciler = LikeReconciler::new(
            store.clone(),
            registry.clone(),
            artifacts.clone(),
            config.rest_api.like_timeout(),
        );

        info!("Tracker client connected to {}", config.rest_api.base_url);
        Ok(Self {
            config,
            store,
            registry,
            reconciler,
            artifacts,
            identity_listener,
            _registry_sync: registry_sync,
        })
    }

    /// Same as [`TrackerClient::connect`] with the snapshot kept at `config.cache.path`.
    pub async fn connect_with_file_cache(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let cache = Arc::new(FileSnapshotCache::new(&config.cache.path));
        Self::connect(config, provider, cache).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<LikeRegistry> {
        &self.registry
    }

    pub fn reconciler(&self) -> &LikeReconciler {
        &self.reconciler
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.current_session()
    }

    /// Creates the account with the identity provider, then registers it with the
    /// backend.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Session, AppError> {
        let session = self
            .store
            .sign_up(email, password, display_name, avatar_url)
            .await?;
        self.register(UserRegistration::manual(&session, password)).await?;
        Ok(session)
    }

    /// Federated sign-in; first-time users are registered with the backend.
    #[instrument(skip(self))]
    pub async fn sign_in_federated(&self) -> Result<Session, AppError> {
        let session = self.store.sign_in_federated().await?;
        self.register(UserRegistration::federated(&session)).await?;
        Ok(session)
    }

    async fn register(&self, registration: UserRegistration) -> Result<RegistrationStatus, AppError> {
        let status = self.artifacts.register_user(&registration).await?;
        debug!("Backend registration for {}: {:?}", registration.email, status);
        Ok(status)
    }

    pub fn is_liked(&self, artifact_id: &ArtifactId) -> bool {
        self.registry.is_liked(artifact_id)
    }

    pub async fn like_toggle(&self, artifact_id: &ArtifactId) -> Result<LikeOutcome, LikeError> {
        self.reconciler.like_toggle(artifact_id).await
    }

    /// Every artifact, with the credential attached when someone is signed in.
    #[instrument(skip(self))]
    pub async fn list_artifacts(&self) -> Result<Vec<Artifact>, AppError> {
        let credential = self.store.await_credential().await?;
        let artifacts = self.artifacts.list_artifacts(credential.as_ref()).await?;
        self.reconciler.observe_all(&artifacts);
        Ok(artifacts)
    }

    /// One page of the catalog for `query`.
    pub async fn browse(&self, query: &CatalogQuery) -> Result<CatalogPage, AppError> {
        let artifacts = self.list_artifacts().await?;
        let page = query.paginate(&artifacts);
        debug!(
            "Catalog page {}/{} ({} matches)",
            page.page, page.total_pages, page.total_items
        );
        Ok(page)
    }

    pub async fn featured_artifacts(&self) -> Result<Vec<Artifact>, AppError> {
        let artifacts = self.artifacts.featured_artifacts().await?;
        self.reconciler.observe_all(&artifacts);
        Ok(artifacts)
    }

    pub async fn get_artifact(&self, id: &ArtifactId) -> Result<Artifact, AppError> {
        let credential = self.store.await_credential().await?;
        let artifact = self.artifacts.get_artifact(credential.as_ref(), id).await?;
        self.reconciler.observe(&artifact);
        Ok(artifact)
    }

    pub async fn my_artifacts(&self) -> Result<Vec<Artifact>, AppError> {
        let (_, credential) = self.require_session().await?;
        let artifacts = self.artifacts.my_artifacts(&credential).await?;
        self.reconciler.observe_all(&artifacts);
        Ok(artifacts)
    }

    pub async fn liked_artifacts(&self) -> Result<Vec<Artifact>, AppError> {
        let (_, credential) = self.require_session().await?;
        let artifacts = self.artifacts.liked_artifacts(&credential).await?;
        self.reconciler.observe_all(&artifacts);
        Ok(artifacts)
    }

    /// Validates the draft, then adds it on behalf of the signed-in user.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_artifact(&self, draft: &NewArtifact) -> Result<Value, AppError> {
        draft.validate()?;
        let (session, credential) = self.require_session().await?;
        self.artifacts
            .create_artifact(&credential, &session, draft)
            .await
    }

    /// Only the user who added an artifact may change it.
    #[instrument(skip(self, artifact), fields(artifact = %artifact.id))]
    pub async fn update_artifact(&self, artifact: &Artifact) -> Result<Value, AppError> {
        let credential = self.require_owner(artifact).await?;
        self.artifacts.update_artifact(&credential, artifact).await
    }

    #[instrument(skip(self, artifact), fields(artifact = %artifact.id))]
    pub async fn delete_artifact(&self, artifact: &Artifact) -> Result<Value, AppError> {
        let credential = self.require_owner(artifact).await?;
        self.artifacts.delete_artifact(&credential, &artifact.id).await
    }

    async fn require_session(&self) -> Result<(Session, Credential), AppError> {
        let session = self.store.current_session().ok_or(AppError::Unauthenticated)?;
        let credential = self
            .store
            .await_credential()
            .await?
            .ok_or(AppError::Unauthenticated)?;
        Ok((session, credential))
    }

    async fn require_owner(&self, artifact: &Artifact) -> Result<Credential, AppError> {
        let (session, credential) = self.require_session().await?;
        if !artifact.is_owned_by(&session.email) {
            return Err(AppError::NotOwner);
        }
        Ok(credential)
    }
}

impl Drop for TrackerClient {
    fn drop(&mut self) {
        self.identity_listener.abort();
    }
}

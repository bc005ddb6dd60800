use crate::application::models::artifact::{Artifact, ArtifactId, NewArtifact, NewArtifactRequest};
use crate::application::models::like::{LikeToggleResponse, LikedEntry};
use crate::application::models::user::{is_user_exists, RegistrationStatus, UserRegistration};
use crate::constants::{
    ARTIFACTS_ENDPOINT, FEATURED_ENDPOINT, LIKED_ENDPOINT, LIKE_ENDPOINT, MY_ARTIFACTS_ENDPOINT,
    USERS_ENDPOINT,
};
use crate::error::{ApiError, AppError};
use crate::session::session::{Credential, Session};
use crate::transport::http_client::ArtifactHttpClient;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// The two like endpoints. Kept narrow so the registry and reconciler can be
/// exercised without a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeApi: Send + Sync {
    /// `GET /liked`: ids of everything the credential's user has liked.
    async fn fetch_liked(&self, credential: &Credential) -> Result<Vec<ArtifactId>, ApiError>;

    /// `POST /like/{id}` with an empty body. The server flips the like and reports the result.
    async fn toggle_like(
        &self,
        credential: &Credential,
        artifact_id: &ArtifactId,
    ) -> Result<LikeToggleResponse, ApiError>;
}

/// Catalog and CRUD operations of the artifacts API.
#[async_trait]
pub trait ArtifactService: Send + Sync {
    async fn list_artifacts(&self, credential: Option<&Credential>) -> Result<Vec<Artifact>, AppError>;

    async fn featured_artifacts(&self) -> Result<Vec<Artifact>, AppError>;

    async fn get_artifact(
        &self,
        credential: Option<&Credential>,
        id: &ArtifactId,
    ) -> Result<Artifact, AppError>;

    async fn my_artifacts(&self, credential: &Credential) -> Result<Vec<Artifact>, AppError>;

    async fn liked_artifacts(&self, credential: &Credential) -> Result<Vec<Artifact>, AppError>;

    /// Sends the draft as is; callers validate first.
    async fn create_artifact(
        &self,
        credential: &Credential,
        session: &Session,
        artifact: &NewArtifact,
    ) -> Result<Value, AppError>;

    async fn update_artifact(&self, credential: &Credential, artifact: &Artifact) -> Result<Value, AppError>;

    async fn delete_artifact(&self, credential: &Credential, id: &ArtifactId) -> Result<Value, AppError>;

    /// `POST /api/users` after an account is created. An already registered email
    /// is not an error.
    async fn register_user(&self, registration: &UserRegistration) -> Result<RegistrationStatus, AppError>;
}

/// REST implementation of [`ArtifactService`] and [`LikeApi`].
pub struct ArtifactServiceImpl {
    client: Arc<ArtifactHttpClient>,
}

impl ArtifactServiceImpl {
    pub fn new(client: Arc<ArtifactHttpClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ArtifactHttpClient {
        &self.client
    }
}

fn artifact_path(id: &ArtifactId) -> String {
    format!("{}/{}", ARTIFACTS_ENDPOINT, id)
}

#[async_trait]
impl ArtifactService for ArtifactServiceImpl {
    async fn list_artifacts(&self, credential: Option<&Credential>) -> Result<Vec<Artifact>, AppError> {
        let artifacts: Vec<Artifact> = self.client.get(ARTIFACTS_ENDPOINT, credential).await?;
        debug!("Loaded {} artifacts", artifacts.len());
        Ok(artifacts)
    }

    async fn featured_artifacts(&self) -> Result<Vec<Artifact>, AppError> {
        let artifacts: Vec<Artifact> = self.client.get(FEATURED_ENDPOINT, None).await?;
        debug!("Loaded {} featured artifacts", artifacts.len());
        Ok(artifacts)
    }

    async fn get_artifact(
        &self,
        credential: Option<&Credential>,
        id: &ArtifactId,
    ) -> Result<Artifact, AppError> {
        Ok(self.client.get(&artifact_path(id), credential).await?)
    }

    async fn my_artifacts(&self, credential: &Credential) -> Result<Vec<Artifact>, AppError> {
        Ok(self.client.get(MY_ARTIFACTS_ENDPOINT, Some(credential)).await?)
    }

    async fn liked_artifacts(&self, credential: &Credential) -> Result<Vec<Artifact>, AppError> {
        Ok(self.client.get(LIKED_ENDPOINT, Some(credential)).await?)
    }

    async fn create_artifact(
        &self,
        credential: &Credential,
        session: &Session,
        artifact: &NewArtifact,
    ) -> Result<Value, AppError> {
        let body = NewArtifactRequest {
            artifact,
            adder_name: &session.display_name,
            adder_email: &session.email,
        };
        let result: Value = self
            .client
            .post(ARTIFACTS_ENDPOINT, Some(&body), Some(credential))
            .await?;
        info!("Artifact '{}' added by {}", artifact.name, session.email);
        Ok(result)
    }

    async fn update_artifact(&self, credential: &Credential, artifact: &Artifact) -> Result<Value, AppError> {
        let body = artifact.update_body()?;
        let result: Value = self
            .client
            .put(&artifact_path(&artifact.id), &body, Some(credential))
            .await?;
        info!("Artifact {} updated", artifact.id);
        Ok(result)
    }

    async fn delete_artifact(&self, credential: &Credential, id: &ArtifactId) -> Result<Value, AppError> {
        let result: Value = self.client.delete(&artifact_path(id), Some(credential)).await?;
        info!("Artifact {} deleted", id);
        Ok(result)
    }

    async fn register_user(&self, registration: &UserRegistration) -> Result<RegistrationStatus, AppError> {
        let result: Result<Value, ApiError> =
            self.client.post(USERS_ENDPOINT, Some(registration), None).await;
        match result {
            Ok(_) => {
                info!("Registered {} with the backend", registration.email);
                Ok(RegistrationStatus::Created)
            }
            Err(ApiError::Status { body, .. }) if is_user_exists(&body) => {
                info!("User {} already registered, proceeding", registration.email);
                Ok(RegistrationStatus::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LikeApi for ArtifactServiceImpl {
    async fn fetch_liked(&self, credential: &Credential) -> Result<Vec<ArtifactId>, ApiError> {
        let entries: Vec<LikedEntry> = self.client.get(LIKED_ENDPOINT, Some(credential)).await?;
        Ok(entries.into_iter().map(LikedEntry::into_id).collect())
    }

    async fn toggle_like(
        &self,
        credential: &Credential,
        artifact_id: &ArtifactId,
    ) -> Result<LikeToggleResponse, ApiError> {
        let path = format!("{}/{}", LIKE_ENDPOINT, artifact_id);
        self.client.post::<_, ()>(&path, None, Some(credential)).await
    }
}

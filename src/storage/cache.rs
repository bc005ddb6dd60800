use crate::error::AuthError;
use crate::presentation::serialization::Serializer;
use crate::session::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Display-safe copy of the signed-in user. Holds no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
}

impl From<&Session> for CachedProfile {
    fn from(session: &Session) -> Self {
        CachedProfile {
            uid: session.user_id.to_string(),
            email: session.email.clone(),
            name: session.display_name.clone(),
            profile_picture: session.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(rename = "isLoggedIn")]
    pub is_logged_in: bool,
    pub user: Option<CachedProfile>,
}

impl SessionSnapshot {
    pub fn signed_in(profile: CachedProfile) -> Self {
        Self {
            is_logged_in: true,
            user: Some(profile),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Option<&CachedProfile> {
        if self.is_logged_in {
            self.user.as_ref()
        } else {
            None
        }
    }
}

/// Durable local store for the last known [`SessionSnapshot`].
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn load(&self) -> Result<Option<SessionSnapshot>, AuthError>;

    async fn store(&self, profile: &CachedProfile) -> Result<(), AuthError>;

    async fn clear(&self) -> Result<(), AuthError>;
}

/// Keeps the snapshot as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    path: PathBuf,
}

impl FileSnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, snapshot: &SessionSnapshot) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json =
            Serializer::to_json_pretty(snapshot).map_err(|e| AuthError::Cache(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Session snapshot written to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotCache for FileSnapshotCache {
    async fn load(&self) -> Result<Option<SessionSnapshot>, AuthError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match Serializer::from_json::<SessionSnapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session snapshot at {}: {:?}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn store(&self, profile: &CachedProfile) -> Result<(), AuthError> {
        self.write(&SessionSnapshot::signed_in(profile.clone())).await
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.write(&SessionSnapshot::signed_out()).await
    }
}

#[derive(Debug, Default)]
pub struct MemorySnapshotCache {
    snapshot: Mutex<Option<SessionSnapshot>>,
}

impl MemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    fn set(&self, snapshot: SessionSnapshot) {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
    }
}

#[async_trait]
impl SnapshotCache for MemorySnapshotCache {
    async fn load(&self) -> Result<Option<SessionSnapshot>, AuthError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn store(&self, profile: &CachedProfile) -> Result<(), AuthError> {
        self.set(SessionSnapshot::signed_in(profile.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.set(SessionSnapshot::signed_out());
        Ok(())
    }
}

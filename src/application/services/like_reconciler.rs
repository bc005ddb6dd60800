use crate::application::models::artifact::{Artifact, ArtifactId};
use crate::application::models::like::{next_like_count, LikeOutcome};
use crate::application::services::artifact_service::LikeApi;
use crate::application::services::like_registry::LikeRegistry;
use crate::error::LikeError;
use crate::session::store::SessionStore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// The only path that changes like state.
///
/// A toggle asks the server to flip the like and trusts its answer. Nothing is
/// changed locally until the server confirms, and at most one toggle per artifact
/// is outstanding at a time.
pub struct LikeReconciler {
    store: Arc<SessionStore>,
    registry: Arc<LikeRegistry>,
    api: Arc<dyn LikeApi>,
    toggle_timeout: Duration,
    pending: Mutex<HashSet<ArtifactId>>,
    counts: Mutex<HashMap<ArtifactId, u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Pending toggle marker; cleared on drop whichever way the toggle settles.
struct PendingToggle<'a> {
    pending: &'a Mutex<HashSet<ArtifactId>>,
    artifact_id: ArtifactId,
}

impl<'a> PendingToggle<'a> {
    fn acquire(pending: &'a Mutex<HashSet<ArtifactId>>, artifact_id: &ArtifactId) -> Option<Self> {
        if !lock(pending).insert(artifact_id.clone()) {
            return None;
        }
        Some(Self {
            pending,
            artifact_id: artifact_id.clone(),
        })
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.artifact_id);
    }
}

impl LikeReconciler {
    pub fn new(
        store: Arc<SessionStore>,
        registry: Arc<LikeRegistry>,
        api: Arc<dyn LikeApi>,
        toggle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            api,
            toggle_timeout,
            pending: Mutex::new(HashSet::new()),
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<LikeRegistry> {
        &self.registry
    }

    /// Asks the server to flip the like on `artifact_id`.
    ///
    /// On success the registry and the displayed count are updated and the
    /// server-reported state is returned. The count is only reported for artifacts
    /// whose count was loaded first. On any error nothing has changed.
    ///
    /// # Errors
    ///
    /// * `Unauthenticated` - nobody is signed in; no request is made.
    /// * `AlreadyInFlight` - a toggle for this artifact has not settled yet.
    /// * `CredentialUnavailable` - the provider could not produce a token.
    /// * `RemoteRejected` - the server answered with a non-success status.
    /// * `NetworkFailure` - transport error, unreadable body, or no answer within the timeout.
    #[instrument(skip(self), fields(artifact = %artifact_id))]
    pub async fn like_toggle(&self, artifact_id: &ArtifactId) -> Result<LikeOutcome, LikeError> {
        let Some(session) = self.store.current_session() else {
            debug!("Like toggle without session");
            return Err(LikeError::Unauthenticated);
        };

        let Some(_pending) = PendingToggle::acquire(&self.pending, artifact_id) else {
            debug!("Like toggle already in flight");
            return Err(LikeError::AlreadyInFlight);
        };

        let credential = match self.store.await_credential().await {
            Ok(Some(credential)) => credential,
            // Signed out while waiting for the token.
            Ok(None) => return Err(LikeError::Unauthenticated),
            Err(e) => {
                warn!("Could not obtain credential: {}", e);
                return Err(LikeError::CredentialUnavailable(e.to_string()));
            }
        };

        let response =
            match tokio::time::timeout(self.toggle_timeout, self.api.toggle_like(&credential, artifact_id)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!("Like toggle failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!("Like toggle timed out after {:?}", self.toggle_timeout);
                    return Err(LikeError::NetworkFailure(format!(
                        "no response within {}s",
                        self.toggle_timeout.as_secs()
                    )));
                }
            };

        self.registry
            .apply_toggle_result(&session.user_id, artifact_id, response.liked);

        let like_count = lock(&self.counts).get_mut(artifact_id).map(|count| {
            *count = next_like_count(*count, response.liked);
            *count
        });

        info!(
            "Artifact {} {} (likes: {:?})",
            artifact_id,
            if response.liked { "liked" } else { "unliked" },
            like_count
        );
        Ok(LikeOutcome {
            artifact_id: artifact_id.clone(),
            liked: response.liked,
            like_count,
        })
    }

    /// Seeds the displayed count from a freshly loaded record. Skipped while a
    /// toggle for it is outstanding so the confirmed result is not applied twice.
    pub fn observe(&self, artifact: &Artifact) {
        if self.is_pending(&artifact.id) {
            return;
        }
        lock(&self.counts).insert(artifact.id.clone(), artifact.likes);
    }

    pub fn observe_all<'a>(&self, artifacts: impl IntoIterator<Item = &'a Artifact>) {
        for artifact in artifacts {
            self.observe(artifact);
        }
    }

    /// Displayed count, `None` until the artifact has been observed or toggled.
    pub fn like_count(&self, artifact_id: &ArtifactId) -> Option<u64> {
        lock(&self.counts).get(artifact_id).copied()
    }

    pub fn is_pending(&self, artifact_id: &ArtifactId) -> bool {
        lock(&self.pending).contains(artifact_id)
    }
}

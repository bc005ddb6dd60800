use crate::application::models::artifact::ArtifactId;
use crate::application::services::artifact_service::LikeApi;
use crate::error::LikeError;
use crate::session::session::UserId;
use crate::session::store::{AuthState, SessionStore, SessionSubscription};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No session, nothing to fetch.
    Idle,
    Loading,
    Ready,
    /// Last fetch failed; the registry stays empty until the next session change
    /// or an explicit [`LikeRegistry::refresh`].
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub generation: u64,
    pub status: SyncStatus,
}

#[derive(Debug, Default)]
struct RegistryState {
    owner: Option<UserId>,
    /// Bumped on every owner change and every explicit refresh; only a fetch started
    /// under the current value may commit.
    generation: u64,
    liked: HashSet<ArtifactId>,
    loading: bool,
    /// Toggles confirmed while a fetch is outstanding, replayed over its result.
    confirmed: HashMap<ArtifactId, bool>,
}

/// Artifacts the signed-in user has liked.
///
/// A passive cache of server state: it is only written by a full fetch after a
/// session change and by [`LikeRegistry::apply_toggle_result`] once the server has
/// confirmed a toggle. It never calls the toggle endpoint itself.
pub struct LikeRegistry {
    store: Arc<SessionStore>,
    api: Arc<dyn LikeApi>,
    state: RwLock<RegistryState>,
    sync: watch::Sender<SyncState>,
}

impl LikeRegistry {
    pub fn new(store: Arc<SessionStore>, api: Arc<dyn LikeApi>) -> Arc<Self> {
        let (sync, _) = watch::channel(SyncState {
            generation: 0,
            status: SyncStatus::Idle,
        });
        Arc::new(Self {
            store,
            api,
            state: RwLock::new(RegistryState::default()),
            sync,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// `false` for unknown ids and whenever nobody is signed in.
    pub fn is_liked(&self, artifact_id: &ArtifactId) -> bool {
        self.read().liked.contains(artifact_id)
    }

    pub fn liked(&self) -> Vec<ArtifactId> {
        let mut liked: Vec<ArtifactId> = self.read().liked.iter().cloned().collect();
        liked.sort();
        liked
    }

    pub fn owner(&self) -> Option<UserId> {
        self.read().owner.clone()
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.borrow().clone()
    }

    pub fn watch_sync(&self) -> watch::Receiver<SyncState> {
        self.sync.subscribe()
    }

    /// Waits until no fetch is outstanding.
    pub async fn synced(&self) -> SyncState {
        let mut rx = self.sync.subscribe();
        let settled = rx
            .wait_for(|s| s.status != SyncStatus::Loading)
            .await
            .map(|s| s.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.sync_state(),
        }
    }

    /// Follows the session store: clears on every owner change and refetches in the
    /// background when someone is signed in. Stops when the subscription is dropped.
    pub fn attach(self: &Arc<Self>) -> SessionSubscription {
        let registry = Arc::downgrade(self);
        self.store.on_session_change(move |state| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let Some(generation) = registry.handle_session_change(state) else {
                return;
            };
            match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        // Failures are recorded in the sync state.
                        let _ = registry.refresh_generation(generation).await;
                    });
                }
                Err(_) => warn!("No async runtime available; liked artifacts not fetched"),
            }
        })
    }

    /// Refetches the liked set for the current owner. Supersedes any fetch still
    /// outstanding; toggles confirmed meanwhile are replayed over the new result.
    pub async fn refresh(&self) -> Result<(), LikeError> {
        let generation = {
            let mut state = self.write();
            if state.owner.is_none() {
                return Ok(());
            }
            state.generation += 1;
            state.loading = true;
            state.generation
        };
        debug!("Refreshing liked artifacts, generation {}", generation);
        self.publish(generation, SyncStatus::Loading);
        self.refresh_generation(generation).await
    }

    /// Resets the registry when the owner changes. Returns the new generation when a
    /// fetch is needed. Profile-only changes keep the current contents.
    pub(crate) fn handle_session_change(&self, auth: &AuthState) -> Option<u64> {
        let next_owner = auth.session().map(|s| s.user_id.clone());
        let (generation, status) = {
            let mut state = self.write();
            if state.owner == next_owner {
                return None;
            }
            state.generation += 1;
            state.owner = next_owner;
            state.liked.clear();
            state.confirmed.clear();
            state.loading = state.owner.is_some();
            let status = if state.loading {
                SyncStatus::Loading
            } else {
                SyncStatus::Idle
            };
            (state.generation, status)
        };

        debug!("Like registry reset, generation {}", generation);
        let fetch = status == SyncStatus::Loading;
        self.publish(generation, status);
        fetch.then_some(generation)
    }

    pub(crate) async fn refresh_generation(&self, generation: u64) -> Result<(), LikeError> {
        let result = match self.store.await_credential().await {
            Ok(Some(credential)) => self
                .api
                .fetch_liked(&credential)
                .await
                .map_err(LikeError::from),
            Ok(None) => Err(LikeError::Unauthenticated),
            Err(e) => Err(LikeError::CredentialUnavailable(e.to_string())),
        };

        let status = {
            let mut state = self.write();
            if state.generation != generation {
                debug!(
                    "Discarding liked artifacts fetched for generation {} (now {})",
                    generation, state.generation
                );
                return Ok(());
            }

            state.liked = match &result {
                Ok(ids) => ids.iter().cloned().collect(),
                Err(_) => HashSet::new(),
            };
            let confirmed: Vec<(ArtifactId, bool)> = state.confirmed.drain().collect();
            for (artifact_id, liked) in confirmed {
                if liked {
                    state.liked.insert(artifact_id);
                } else {
                    state.liked.remove(&artifact_id);
                }
            }
            state.loading = false;

            match &result {
                Ok(_) => {
                    info!("Loaded {} liked artifacts", state.liked.len());
                    SyncStatus::Ready
                }
                Err(e) => {
                    warn!("Failed to load liked artifacts: {}", e);
                    SyncStatus::Failed(e.to_string())
                }
            }
        };
        self.publish(generation, status);
        result.map(|_| ())
    }

    /// Records a toggle the server has confirmed for `owner`. Ignored, returning
    /// `false`, if the session has moved on to someone else meanwhile.
    pub(crate) fn apply_toggle_result(&self, owner: &UserId, artifact_id: &ArtifactId, liked: bool) -> bool {
        let mut state = self.write();
        if state.owner.as_ref() != Some(owner) {
            debug!("Ignoring like result for {}: session changed", artifact_id);
            return false;
        }
        if liked {
            state.liked.insert(artifact_id.clone());
        } else {
            state.liked.remove(artifact_id);
        }
        if state.loading {
            state.confirmed.insert(artifact_id.clone(), liked);
        }
        true
    }

    fn publish(&self, generation: u64, status: SyncStatus) {
        self.sync.send_replace(SyncState { generation, status });
    }
}

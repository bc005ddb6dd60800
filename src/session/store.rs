use crate::config::IdentityConfig;
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::AuthError;
use crate::session::interface::{Identity, IdentityProvider, ProfileUpdate};
use crate::session::session::{Credential, Session};
use crate::storage::cache::{CachedProfile, SnapshotCache};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Who is signed in, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not reported yet.
    Unknown,
    Anonymous,
    Authenticated(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Single source of truth for the current session.
///
/// State only changes when the identity provider reports an event; the sign-in,
/// sign-up, sign-out and profile operations forward to the provider and the
/// resulting transition comes back through the same event path.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    cache: Arc<dyn SnapshotCache>,
    identity: IdentityConfig,
    state: watch::Sender<AuthState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    /// Held while a state is delivered so every listener sees transitions in order.
    delivery: Mutex<()>,
    next_listener: AtomicU64,
    cached_profile: RwLock<Option<CachedProfile>>,
}

/// Keeps a listener registered until dropped.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct SessionSubscription {
    store: Weak<SessionStore>,
    id: u64,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            lock(&store.listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionStore {
    /// Builds the store in the `Unknown` state and loads the cached profile for early paint.
    pub async fn new(
        provider: Arc<dyn IdentityProvider>,
        cache: Arc<dyn SnapshotCache>,
        identity: IdentityConfig,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::Unknown);
        let store = Arc::new(Self {
            provider,
            cache,
            identity,
            state,
            listeners: Mutex::new(Vec::new()),
            delivery: Mutex::new(()),
            next_listener: AtomicU64::new(0),
            cached_profile: RwLock::new(None),
        });
        store.sync_from_cache().await;
        store
    }

    /// Forwards provider events into the store until the provider closes the stream
    /// or the store is dropped.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(identity) = events.recv().await {
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.apply_identity(identity).await;
            }
            debug!("Identity event stream closed");
        })
    }

    pub fn current_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Receiver that always holds the latest [`AuthState`].
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Waits for the first transition out of `Unknown`.
    pub async fn resolved(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        let resolved = rx.wait_for(AuthState::is_resolved).await.map(|s| s.clone());
        match resolved {
            Ok(state) => state,
            Err(_) => self.current_state(),
        }
    }

    /// Registers `listener` and calls it right away with the current state, then on
    /// every transition, never out of order.
    ///
    /// Listeners must not register further listeners from inside the callback.
    pub fn on_session_change<F>(self: &Arc<Self>, listener: F) -> SessionSubscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);

        let _delivery = lock(&self.delivery);
        lock(&self.listeners).push((id, listener.clone()));
        let current = self.current_state();
        listener(&current);

        SessionSubscription {
            store: Arc::downgrade(self),
            id,
        }
    }

    /// A fresh bearer token for the current session, `None` without one.
    /// Only genuine provider failures are errors.
    pub async fn await_credential(&self) -> Result<Option<Credential>, AuthError> {
        if !self.state.borrow().is_authenticated() {
            return Ok(None);
        }
        self.provider.id_token().await
    }

    /// Last persisted profile, available before the provider has answered.
    pub fn cached_profile(&self) -> Option<CachedProfile> {
        self.cached_profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-reads the persisted snapshot, e.g. after another process changed it.
    /// Never touches the authoritative [`AuthState`].
    pub async fn sync_from_cache(&self) {
        let profile = match self.cache.load().await {
            Ok(snapshot) => snapshot.and_then(|s| s.profile().cloned()),
            Err(e) => {
                warn!("Failed to read session snapshot: {}", e);
                None
            }
        };
        *self
            .cached_profile
            .write()
            .unwrap_or_else(|e| e.into_inner()) = profile;
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        require_credentials(email, password)?;
        let identity = self.provider.sign_in(email, password).await.map_err(|e| {
            warn!("Sign-in failed: {}", e);
            e
        })?;
        info!("Signed in as {}", identity.email);
        Ok(Session::from_identity(&identity, &self.identity))
    }

    /// Creates the account, then applies the optional display name and avatar.
    /// Weak passwords are rejected before the provider is asked.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Session, AuthError> {
        require_credentials(email, password)?;
        require_strong_password(password)?;
        let mut identity = self.provider.sign_up(email, password).await.map_err(|e| {
            warn!("Sign-up failed: {}", e);
            e
        })?;

        let update = ProfileUpdate {
            display_name: display_name.map(String::from),
            avatar_url: avatar_url.map(String::from),
        };
        if !update.is_empty() {
            identity = self.provider.update_profile(&update).await?;
        }
        info!("Account created for {}", identity.email);
        Ok(Session::from_identity(&identity, &self.identity))
    }

    #[instrument(skip(self))]
    pub async fn sign_in_federated(&self) -> Result<Session, AuthError> {
        let identity = self.provider.sign_in_federated().await.map_err(|e| {
            warn!("Federated sign-in failed: {}", e);
            e
        })?;
        info!("Signed in as {} through federated provider", identity.email);
        Ok(Session::from_identity(&identity, &self.identity))
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await.map_err(|e| {
            warn!("Sign-out failed: {}", e);
            e
        })?;
        info!("Signed out");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Session, AuthError> {
        if self.current_session().is_none() {
            return Err(AuthError::NoSession);
        }
        let identity = self.provider.update_profile(update).await?;
        Ok(Session::from_identity(&identity, &self.identity))
    }

    /// Applies one provider event. Persists or clears the snapshot, then notifies
    /// listeners if the state actually changed.
    pub(crate) async fn apply_identity(&self, identity: Option<Identity>) {
        let next = match identity {
            Some(identity) => {
                let session = Session::from_identity(&identity, &self.identity);
                let profile = CachedProfile::from(&session);
                if let Err(e) = self.cache.store(&profile).await {
                    warn!("Failed to persist session snapshot: {}", e);
                }
                *self
                    .cached_profile
                    .write()
                    .unwrap_or_else(|e| e.into_inner()) = Some(profile);
                AuthState::Authenticated(session)
            }
            None => {
                if let Err(e) = self.cache.clear().await {
                    warn!("Failed to clear session snapshot: {}", e);
                }
                *self
                    .cached_profile
                    .write()
                    .unwrap_or_else(|e| e.into_inner()) = None;
                AuthState::Anonymous
            }
        };

        let _delivery = lock(&self.delivery);
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        });
        if !changed {
            return;
        }

        debug!("Session state changed: {:?}", next.session().map(|s| &s.user_id));
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }
}

fn require_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Please provide email and password".to_string(),
        ));
    }
    Ok(())
}

fn require_strong_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::InvalidInput(
            "Must include at least one uppercase letter".to_string(),
        ));
    }
    Ok(())
}

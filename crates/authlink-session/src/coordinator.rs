//! The session coordinator: owns [`SessionState`] for one client.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Subscribing to the identity provider once, for its whole lifetime
//! - Running the four auth actions and writing their state transitions
//! - Reporting progress and failures on the notification channel
//! - Releasing the provider subscription when it is unmounted
//!
//! # Reading vs. acting
//!
//! Consumers get two separate handles. A [`SessionObserver`] can only read
//! state; an [`AuthActions`] can only run actions. A component that just
//! shows the user's name never holds the power to log them out.
//!
//! # Transition table
//!
//! ```text
//! mount                         {Unresolved, auth:false, loading:true}
//! event Changed(u)              {u,          auth:u.is_some(), loading:false}
//! event Error                   {keep user,  auth:false, loading:false} + global error
//! event Completed               {keep user,  auth:true,  loading:false}
//! popup ok                      {SignedIn,   auth:true,  loading:false}
//! popup / sign-up failed        {keep user,  auth:false, loading:false}
//! email sign-in, stored token   {SignedOut,  auth:true,  loading:false}
//! email sign-in, new token      {SignedOut,  auth:true,  loading:false}
//! email sign-in, no token       (unchanged)
//! sign-up ok                    {SignedIn(name applied), auth:true, loading:false}
//! logout (always)               {SignedOut,  auth:false, loading:false}
//! ```
//!
//! # Concurrency note
//!
//! Actions are not serialized against each other or against provider
//! events. Every transition is applied atomically through the watch
//! channel, and the last one to land wins. Nothing can be cancelled once
//! started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use authlink_backend::LoginBackend;
use authlink_protocol::{SignInCredentials, SignUpCredentials};
use tokio::sync::watch;

use crate::{
    AuthEvent, AuthListener, BroadcastNotifier, ErrorKind, ErrorReport, IdentityProvider,
    KeyValueStore, MemoryStore, Notice, Notifier, OAuthProvider, ProfileUpdate, SessionConfig,
    SessionError, SessionState, Subscription, UserRecord,
};

/// Shared by the coordinator, its provider listener and every
/// [`AuthActions`] clone.
struct Inner<P, B> {
    provider: Arc<P>,
    backend: B,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
    config: SessionConfig,
}

impl<P: IdentityProvider, B: LoginBackend> Inner<P, B> {
    fn apply_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::Changed(user) => {
                tracing::debug!(signed_in = user.is_some(), "provider auth state changed");
                self.state.send_replace(SessionState::from_provider(user));
            }
            AuthEvent::Error(message) => {
                tracing::warn!(%message, "identity provider observer error");
                self.fail(ErrorReport::global(ErrorKind::Subscription, message));
            }
            AuthEvent::Completed => {
                tracing::debug!("identity provider observer completed");
                self.state.send_modify(SessionState::confirm);
            }
        }
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    fn fail(&self, report: ErrorReport) {
        self.state.send_modify(SessionState::reject);
        self.notify(Notice::FetchError(report));
    }
}

// ---------------------------------------------------------------------------
// CoordinatorBuilder
// ---------------------------------------------------------------------------

/// Collects collaborators and mounts a [`SessionCoordinator`].
///
/// ```rust,ignore
/// let coordinator = SessionCoordinator::builder(provider, backend)
///     .store(FileStore::new("session.json"))
///     .notifier(notifier.clone())
///     .mount();
/// ```
pub struct CoordinatorBuilder<P, B> {
    provider: Arc<P>,
    backend: B,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
}

impl<P: IdentityProvider, B: LoginBackend> CoordinatorBuilder<P, B> {
    /// Starts with a [`MemoryStore`], a fresh [`BroadcastNotifier`] and the
    /// default [`SessionConfig`].
    pub fn new(provider: Arc<P>, backend: B) -> Self {
        Self {
            provider,
            backend,
            store: Arc::new(MemoryStore::new()),
            notifier: Arc::new(BroadcastNotifier::default()),
            config: SessionConfig::default(),
        }
    }

    /// Sets the durable store that holds the backend token.
    pub fn store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Sets the notification channel.
    pub fn notifier(mut self, notifier: impl Notifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Sets the session configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the state and subscribes to the provider.
    pub fn mount(self) -> SessionCoordinator<P, B> {
        SessionCoordinator::mount(self)
    }
}

// ---------------------------------------------------------------------------
// SessionCoordinator
// ---------------------------------------------------------------------------

/// Owns a session for as long as it is mounted.
///
/// ## Lifecycle
///
/// ```text
/// builder().mount() ──→ [subscribed] ──→ unmount() / drop ──→ [released]
///                            │
///                   provider events + actions
///                   write SessionState
/// ```
///
/// Dropping the coordinator unmounts it. `AuthActions` clones taken before
/// that keep working against the same state, but provider events no longer
/// reach it.
pub struct SessionCoordinator<P: IdentityProvider, B: LoginBackend> {
    inner: Arc<Inner<P, B>>,
    observer: SessionObserver,
    /// Cleared at unmount. The listener checks it before touching state, so
    /// an event already in flight when we unsubscribe is dropped.
    active: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl<P: IdentityProvider, B: LoginBackend> SessionCoordinator<P, B> {
    /// Creates a builder.
    pub fn builder(provider: Arc<P>, backend: B) -> CoordinatorBuilder<P, B> {
        CoordinatorBuilder::new(provider, backend)
    }

    fn mount(builder: CoordinatorBuilder<P, B>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::initial());
        let inner = Arc::new(Inner {
            provider: builder.provider,
            backend: builder.backend,
            store: builder.store,
            notifier: builder.notifier,
            state: state_tx,
            config: builder.config,
        });
        let active = Arc::new(AtomicBool::new(true));

        // One listener for the whole mount. It reaches the state through a
        // weak handle so the provider never keeps the session alive.
        let listener: AuthListener = {
            let inner: Weak<Inner<P, B>> = Arc::downgrade(&inner);
            let active = Arc::clone(&active);
            Arc::new(move |event: AuthEvent| {
                if !active.load(Ordering::Acquire) {
                    tracing::trace!(?event, "ignoring auth event after unmount");
                    return;
                }
                if let Some(inner) = inner.upgrade() {
                    inner.apply_event(event);
                }
            })
        };
        let subscription = inner.provider.on_auth_state_changed(listener);
        tracing::info!("session coordinator mounted");

        Self {
            inner,
            observer: SessionObserver { receiver: state_rx },
            active,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Returns a read-only view of the session.
    pub fn observer(&self) -> SessionObserver {
        self.observer.clone()
    }

    /// Returns the action handle.
    pub fn actions(&self) -> AuthActions<P, B> {
        AuthActions {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.observer.current()
    }

    /// Returns `true` until [`unmount`](Self::unmount) runs.
    pub fn is_mounted(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Releases the provider subscription. Safe to call more than once; the
    /// subscription is released on the first call only.
    pub fn unmount(&self) {
        self.active.store(false, Ordering::Release);
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::info!("session coordinator unmounted");
        }
    }
}

impl<P: IdentityProvider, B: LoginBackend> Drop for SessionCoordinator<P, B> {
    fn drop(&mut self) {
        self.unmount();
    }
}

// ---------------------------------------------------------------------------
// SessionObserver
// ---------------------------------------------------------------------------

/// Read-only access to the session state.
///
/// Cheap to clone; every clone sees the same state.
#[derive(Debug, Clone)]
pub struct SessionObserver {
    receiver: watch::Receiver<SessionState>,
}

impl SessionObserver {
    /// Snapshot of the current state.
    pub fn current(&self) -> SessionState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next state write and returns the new state.
    ///
    /// Returns `None` once the session has been dropped and no further
    /// change can happen.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until the state is no longer loading and returns it.
    pub async fn wait_until_loaded(&mut self) -> Option<SessionState> {
        self.receiver
            .wait_for(|state| !state.is_loading)
            .await
            .ok()
            .map(|state| SessionState::clone(&state))
    }
}

// ---------------------------------------------------------------------------
// AuthActions
// ---------------------------------------------------------------------------

/// The command side of a session.
///
/// Actions never fail from the caller's point of view. Each one settles the
/// session into a safe state and reports what went wrong through the
/// notifier.
pub struct AuthActions<P, B> {
    inner: Arc<Inner<P, B>>,
}

impl<P, B> Clone for AuthActions<P, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: IdentityProvider, B: LoginBackend> AuthActions<P, B> {
    /// Signs in through an OAuth popup.
    ///
    /// `provider_name` is mapped with [`OAuthProvider::from_name`], so an
    /// unknown name signs in with Google.
    pub async fn sign_in_with_popup(&self, provider_name: &str) {
        let provider = OAuthProvider::from_name(provider_name);
        let inner = &self.inner;
        inner.notify(Notice::FetchStart);

        match inner.provider.sign_in_with_popup(provider).await {
            Ok(user) => {
                tracing::info!(uid = %user.uid, %provider, "signed in with popup");
                inner.state.send_replace(SessionState::identity(user));
                inner.notify(Notice::FetchSuccess);
            }
            Err(e) => {
                tracing::warn!(%provider, error = %e, "popup sign-in failed");
                inner.fail(ErrorReport::global(ErrorKind::Popup, e.to_string()));
            }
        }
    }

    /// Signs in through the login backend.
    ///
    /// A token already in storage short-circuits the whole flow: the
    /// session becomes backend-authenticated and nothing is sent. Otherwise
    /// the credentials are posted and a returned token is persisted.
    ///
    /// Request failures and responses without a token leave the state alone
    /// and are reported inline, for the sign-in form to show.
    pub async fn sign_in_with_email_and_password(&self, credentials: SignInCredentials) {
        let inner = &self.inner;
        let key = inner.config.token_key.as_str();

        match inner.store.get(key) {
            Ok(Some(token)) if !token.is_empty() => {
                tracing::info!("stored backend token found, skipping login request");
                inner.state.send_replace(SessionState::backend_token());
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored token, logging in again");
            }
        }

        inner.notify(Notice::FetchStart);
        let response = match inner.backend.login(&credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "backend login failed");
                inner.notify(Notice::FetchError(ErrorReport::inline(
                    ErrorKind::Backend,
                    e.user_message(),
                )));
                return;
            }
        };

        let Some(token) = response.token() else {
            tracing::warn!("login response carried no access token");
            inner.notify(Notice::FetchError(ErrorReport::inline(
                ErrorKind::Backend,
                "login response did not include an access token",
            )));
            return;
        };

        if let Err(e) = inner.store.set(key, token) {
            tracing::warn!(error = %e, "could not persist backend token");
            inner.fail(ErrorReport::global(ErrorKind::Storage, e.to_string()));
            return;
        }

        tracing::info!("signed in with backend token");
        inner.state.send_replace(SessionState::backend_token());
        inner.notify(Notice::FetchSuccess);
    }

    /// Creates a provider account, sends the verification email and sets
    /// the display name.
    ///
    /// The resulting session user carries `credentials.name` as its display
    /// name even though the record returned at creation time predates the
    /// profile update.
    pub async fn create_user_with_email_and_password(&self, credentials: SignUpCredentials) {
        let inner = &self.inner;
        inner.notify(Notice::FetchStart);

        match self.create_account(&credentials).await {
            Ok(user) => {
                tracing::info!(uid = %user.uid, "account created");
                inner.state.send_replace(SessionState::identity(user));
                inner.notify(Notice::FetchSuccess);
            }
            Err(e) => {
                tracing::warn!(error = %e, "account creation failed");
                inner.fail(ErrorReport::global(ErrorKind::AccountCreation, e.to_string()));
            }
        }
    }

    async fn create_account(&self, credentials: &SignUpCredentials) -> Result<UserRecord, SessionError> {
        let provider = &self.inner.provider;
        let mut user = provider
            .create_user_with_email_and_password(&credentials.email, &credentials.password)
            .await?;
        provider
            .send_email_verification(&self.inner.config.verification)
            .await?;
        provider
            .update_profile(&ProfileUpdate {
                display_name: Some(credentials.name.clone()),
            })
            .await?;
        user.display_name = Some(credentials.name.clone());
        Ok(user)
    }

    /// Signs out of both systems.
    ///
    /// The stored token is removed first. Whatever the provider answers,
    /// the session ends signed out and not loading.
    pub async fn logout(&self) {
        let inner = &self.inner;
        if let Err(e) = inner.store.remove(&inner.config.token_key) {
            tracing::warn!(error = %e, "could not remove stored token");
        }
        inner.state.send_modify(|state| state.is_loading = true);

        if let Err(e) = inner.provider.sign_out().await {
            tracing::warn!(error = %e, "provider sign-out failed");
        }
        inner.state.send_replace(SessionState::signed_out());
        tracing::info!("signed out");
    }
}

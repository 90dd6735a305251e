//! `AuthProvider` builder and handle.
//!
//! This is the entry point for applications. It ties together all the
//! layers: config → login backend → token store → session coordinator, and
//! hands back one object that owns the mounted session.

use std::sync::Arc;

use authlink_backend::HttpLoginBackend;
use authlink_session::{
    AuthActions, BroadcastNotifier, FileStore, IdentityProvider, KeyValueStore, MemoryStore,
    Notice, Notifier, SessionCoordinator, SessionObserver, SessionState,
};
use tokio::sync::broadcast;

use crate::{AuthConfig, AuthlinkError};

/// The action handle returned by [`AuthProvider::actions`].
pub type Actions<P> = AuthActions<P, HttpLoginBackend>;

/// Sends every notice to the provider's broadcast channel and to any
/// extra sinks registered on the builder.
struct Fanout {
    channel: BroadcastNotifier,
    sinks: Vec<Arc<dyn Notifier>>,
}

impl Notifier for Fanout {
    fn notify(&self, notice: Notice) {
        for sink in &self.sinks {
            sink.notify(notice.clone());
        }
        self.channel.notify(notice);
    }
}

/// Builder for configuring and mounting an [`AuthProvider`].
///
/// # Example
///
/// ```rust,ignore
/// use authlink::prelude::*;
///
/// let provider = AuthProviderBuilder::new()
///     .config(AuthConfig::from_env())
///     .build(Arc::new(my_identity_provider))?;
/// let mut notices = provider.notices();
/// provider.actions().sign_in_with_popup("github").await;
/// ```
pub struct AuthProviderBuilder {
    config: AuthConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    sinks: Vec<Arc<dyn Notifier>>,
}

impl AuthProviderBuilder {
    /// Creates a builder with [`AuthConfig::default`].
    pub fn new() -> Self {
        Self {
            config: AuthConfig::default(),
            store: None,
            sinks: Vec::new(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the token store. Without this, a [`FileStore`] at
    /// `config.store_path` is used, or a [`MemoryStore`] if no path is set.
    pub fn store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Adds a notifier that receives every notice alongside the
    /// [`notices`](AuthProvider::notices) channel.
    pub fn notifier(mut self, notifier: impl Notifier) -> Self {
        self.sinks.push(Arc::new(notifier));
        self
    }

    /// Wires the HTTP login backend and the store, and mounts a session on
    /// `identity`.
    ///
    /// Fails if the configured backend URL is unusable.
    pub fn build<P: IdentityProvider>(
        self,
        identity: Arc<P>,
    ) -> Result<AuthProvider<P>, AuthlinkError> {
        let config = self.config;
        let backend = HttpLoginBackend::with_timeout(&config.backend_url, config.request_timeout)?;

        let store: Arc<dyn KeyValueStore> = match (self.store, &config.store_path) {
            (Some(store), _) => store,
            (None, Some(path)) => {
                tracing::info!(path = %path.display(), "using file token store");
                Arc::new(FileStore::new(path))
            }
            (None, None) => Arc::new(MemoryStore::new()),
        };

        let channel = BroadcastNotifier::default();
        let notifier = Fanout {
            channel: channel.clone(),
            sinks: self.sinks,
        };

        let coordinator = SessionCoordinator::builder(identity, backend)
            .store(store)
            .notifier(notifier)
            .config(config.session_config())
            .mount();

        Ok(AuthProvider {
            coordinator,
            channel,
            config,
        })
    }
}

impl Default for AuthProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A mounted auth session.
///
/// Dropping it unmounts the session and releases the identity provider
/// subscription.
pub struct AuthProvider<P: IdentityProvider> {
    coordinator: SessionCoordinator<P, HttpLoginBackend>,
    channel: BroadcastNotifier,
    config: AuthConfig,
}

impl<P: IdentityProvider> AuthProvider<P> {
    /// Returns a read-only view of the session.
    pub fn observer(&self) -> SessionObserver {
        self.coordinator.observer()
    }

    /// Returns the action handle.
    pub fn actions(&self) -> Actions<P> {
        self.coordinator.actions()
    }

    /// Subscribes to notices sent from now on.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.channel.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.coordinator.state()
    }

    /// The configuration this provider was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Returns `true` until [`unmount`](Self::unmount) runs.
    pub fn is_mounted(&self) -> bool {
        self.coordinator.is_mounted()
    }

    /// Releases the identity provider subscription. Idempotent.
    pub fn unmount(&self) {
        self.coordinator.unmount();
    }
}

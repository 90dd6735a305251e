//! # Authlink
//!
//! Client-side authentication sessions over two auth systems.
//!
//! Authlink keeps one answer to "who is signed in" while talking to a
//! hosted identity provider (OAuth popups, email/password accounts) and a
//! separate token login backend (`POST /auth/login`). Applications read the
//! session through a [`SessionObserver`](authlink_session::SessionObserver)
//! and change it through [`AuthActions`](authlink_session::AuthActions);
//! progress and failures arrive on a notice channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authlink::prelude::*;
//!
//! // Implement IdentityProvider for your SDK binding, then:
//! // let provider = AuthProviderBuilder::new()
//! //     .config(AuthConfig::from_env())
//! //     .build(Arc::new(my_identity))?;
//! // provider.actions().sign_in_with_popup("google").await;
//! // let state = provider.observer().wait_until_loaded().await;
//! ```

mod config;
mod error;
mod logging;
mod provider;

pub use config::{
    AuthConfig, DEFAULT_BACKEND_URL, ENV_BACKEND_URL, ENV_REQUEST_TIMEOUT_SECS, ENV_STORE_PATH,
    ENV_TOKEN_KEY, ENV_VERIFICATION_URL,
};
pub use error::AuthlinkError;
pub use logging::{DEFAULT_FILTER, init_logging};
pub use provider::{Actions, AuthProvider, AuthProviderBuilder};

pub use authlink_backend as backend;
pub use authlink_protocol as protocol;
pub use authlink_session as session;

/// Everything an application needs in one import.
pub mod prelude {
    pub use std::sync::Arc;

    pub use authlink_backend::{BackendError, HttpLoginBackend, LoginBackend};
    pub use authlink_protocol::{LoginResponse, ProtocolError};
    pub use authlink_session::{
        AuthActions, AuthEvent, AuthListener, AuthMethod, BroadcastNotifier, ErrorKind,
        ErrorReport, FileStore, IdentityProvider, InMemoryIdentityProvider, KeyValueStore,
        MemoryStore, Notice, Notifier, OAuthProvider, Operation, Presentation, ProfileUpdate,
        RecordingNotifier, SessionConfig, SessionError, SessionObserver, SessionState,
        SignInCredentials, SignUpCredentials, Subscription, UserRecord, UserSlot,
        VerificationSettings,
    };

    pub use crate::{
        Actions, AuthConfig, AuthProvider, AuthProviderBuilder, AuthlinkError, init_logging,
    };
}

//! Authentication session management for Authlink.
//!
//! This crate keeps one client's view of "who is signed in":
//!
//! 1. **Identity**: the external identity provider is reached through the
//!    [`IdentityProvider`] trait; [`InMemoryIdentityProvider`] is a local
//!    implementation for tests and demos.
//! 2. **Session state**: [`SessionState`] is owned by a
//!    [`SessionCoordinator`] and read through a [`SessionObserver`].
//! 3. **Actions**: sign up, sign in, popup sign-in and logout live on
//!    [`AuthActions`], a separate handle from the observer.
//! 4. **Collaborators**: durable storage ([`KeyValueStore`]) and the
//!    global notification channel ([`Notifier`]) are injected, never
//!    reached through globals.
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← observes SessionState, calls AuthActions
//!     ↕
//! Session Layer (this crate)  ← coordinates identity provider + backend
//!     ↕
//! Backend / Protocol (below)  ← POST /auth/login, wire types
//! ```

mod coordinator;
mod error;
mod identity;
mod memory;
mod notify;
mod session;
mod store;

pub use authlink_protocol::{SignInCredentials, SignUpCredentials};
pub use coordinator::{AuthActions, CoordinatorBuilder, SessionCoordinator, SessionObserver};
pub use error::SessionError;
pub use identity::{
    AuthEvent, AuthListener, IdentityProvider, OAuthProvider, ProfileUpdate, Subscription,
    VerificationSettings,
};
pub use memory::{InMemoryIdentityProvider, Operation};
pub use notify::{
    BroadcastNotifier, ErrorKind, ErrorReport, Notice, Notifier, Presentation, RecordingNotifier,
};
pub use session::{AuthMethod, SessionConfig, SessionState, UserRecord, UserSlot};
pub use store::{FileStore, KeyValueStore, MemoryStore};

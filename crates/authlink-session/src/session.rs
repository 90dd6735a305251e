//! Session types: the data structures that describe who is signed in.
//!
//! A [`SessionState`] tracks:
//! - WHO the user is ([`UserSlot`])
//! - WHETHER they count as authenticated, and by WHICH system
//!   ([`AuthMethod`])
//! - WHETHER a state resolution is still in flight (`is_loading`)

use serde::{Deserialize, Serialize};

use crate::VerificationSettings;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session coordinator.
///
/// `SessionConfig::default()` matches what a browser deployment uses; override
/// just the fields you care about.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key under which the backend access token is kept in durable storage.
    ///
    /// Default: `"token"`.
    pub token_key: String,

    /// Settings passed along with the verification email sent after
    /// sign-up.
    pub verification: VerificationSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "token".to_string(),
            verification: VerificationSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// An identity as reported by the external identity provider.
///
/// The provider owns this record. The coordinator keeps a clone and only
/// ever rewrites `display_name`, right after a sign-up profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// UserSlot
// ---------------------------------------------------------------------------

/// The user part of a session.
///
/// ```text
///   Unresolved ──(first provider event / action)──→ SignedIn | SignedOut
/// ```
///
/// `Unresolved` only exists before anything has been heard from the
/// provider. After that the slot flips between `SignedIn` and `SignedOut`
/// and never goes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserSlot {
    /// Nothing known yet.
    #[default]
    Unresolved,

    /// Resolved, and there is no provider user. Also the slot of a session
    /// authenticated through a backend token.
    SignedOut,

    /// Resolved to a provider user.
    SignedIn(UserRecord),
}

impl UserSlot {
    /// Builds the slot for a provider answer: `Some` → signed in,
    /// `None` → signed out.
    pub fn from_provider(user: Option<UserRecord>) -> Self {
        match user {
            Some(user) => Self::SignedIn(user),
            None => Self::SignedOut,
        }
    }

    /// Returns the provider user, if any.
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AuthMethod
// ---------------------------------------------------------------------------

/// Which of the two authentication systems vouches for the session.
///
/// Authlink sits on top of two independent mechanisms: the external
/// identity provider, and a token issued by the remote login backend.
/// They are not reconciled. A session is authenticated if either one says
/// so, and `user` only carries an identity for [`AuthMethod::Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// The identity provider signed the user in (popup, sign-up, or a
    /// provider state event).
    Identity,

    /// A backend access token is held in durable storage.
    BackendToken,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The observable authentication state of one client.
///
/// Transitions are written wholesale by the coordinator; see
/// [`SessionCoordinator`](crate::SessionCoordinator) for the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: UserSlot,
    /// `Some` exactly when `is_authenticated` is `true`.
    pub method: Option<AuthMethod>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl SessionState {
    /// The state at mount: nothing resolved, loading.
    pub fn initial() -> Self {
        Self {
            user: UserSlot::Unresolved,
            method: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    /// Signed in through the identity provider.
    pub fn identity(user: UserRecord) -> Self {
        Self {
            user: UserSlot::SignedIn(user),
            method: Some(AuthMethod::Identity),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// Authenticated by a backend token. There is no provider user.
    pub fn backend_token() -> Self {
        Self {
            user: UserSlot::SignedOut,
            method: Some(AuthMethod::BackendToken),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// Fully signed out.
    pub fn signed_out() -> Self {
        Self {
            user: UserSlot::SignedOut,
            method: None,
            is_authenticated: false,
            is_loading: false,
        }
    }

    /// Applies a provider answer: authenticated iff there is a user.
    pub fn from_provider(user: Option<UserRecord>) -> Self {
        let is_authenticated = user.is_some();
        Self {
            user: UserSlot::from_provider(user),
            method: is_authenticated.then_some(AuthMethod::Identity),
            is_authenticated,
            is_loading: false,
        }
    }

    /// Marks the session as not authenticated, keeping the current user.
    pub fn reject(&mut self) {
        self.is_authenticated = false;
        self.is_loading = false;
        self.method = None;
    }

    /// Marks the session as authenticated by the provider, keeping the
    /// current user.
    pub fn confirm(&mut self) {
        self.is_authenticated = true;
        self.is_loading = false;
        self.method = Some(AuthMethod::Identity);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> UserRecord {
        UserRecord::new("u-1").with_email("ada@example.com")
    }

    #[test]
    fn test_initial_is_unresolved_and_loading() {
        let state = SessionState::initial();
        assert_eq!(state.user, UserSlot::Unresolved);
        assert!(!state.is_authenticated);
        assert!(state.is_loading);
        assert_eq!(state.method, None);
    }

    #[test]
    fn test_from_provider_some_is_authenticated_by_identity() {
        let state = SessionState::from_provider(Some(ada()));
        assert_eq!(state.user.user(), Some(&ada()));
        assert!(state.is_authenticated);
        assert_eq!(state.method, Some(AuthMethod::Identity));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_from_provider_none_is_signed_out() {
        assert_eq!(SessionState::from_provider(None), SessionState::signed_out());
    }

    #[test]
    fn test_backend_token_has_no_user() {
        let state = SessionState::backend_token();
        assert_eq!(state.user, UserSlot::SignedOut);
        assert!(state.is_authenticated);
        assert_eq!(state.method, Some(AuthMethod::BackendToken));
    }

    #[test]
    fn test_reject_keeps_user() {
        let mut state = SessionState::identity(ada());
        state.reject();
        assert_eq!(state.user.user(), Some(&ada()));
        assert!(!state.is_authenticated);
        assert_eq!(state.method, None);
    }

    #[test]
    fn test_confirm_keeps_unresolved_user() {
        let mut state = SessionState::initial();
        state.confirm();
        assert_eq!(state.user, UserSlot::Unresolved);
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_user_record_serializes_camel_case() {
        let json = serde_json::to_value(ada().with_display_name("Ada")).unwrap();
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["uid"], "u-1");
    }

    #[test]
    fn test_session_config_default_token_key() {
        assert_eq!(SessionConfig::default().token_key, "token");
    }
}

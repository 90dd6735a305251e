//! The identity provider seam.
//!
//! Authlink doesn't implement accounts, password checks or OAuth itself;
//! that's the identity provider's job (Firebase, Auth0, Supabase, ...).
//! The [`IdentityProvider`] trait describes the slice of such an SDK that
//! the coordinator relies on. Production code implements it over the
//! vendor SDK, tests and demos use
//! [`InMemoryIdentityProvider`](crate::InMemoryIdentityProvider).

use std::fmt;
use std::sync::Arc;

use authlink_protocol::SignInCredentials;

use crate::{SessionError, UserRecord};

// ---------------------------------------------------------------------------
// OAuth providers
// ---------------------------------------------------------------------------

/// A popup sign-in provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Facebook,
    Twitter,
    Github,
}

impl OAuthProvider {
    /// All providers, in a stable order.
    pub const ALL: [Self; 4] = [Self::Google, Self::Facebook, Self::Twitter, Self::Github];

    /// Maps a provider name to a handle.
    ///
    /// Matching is case-insensitive. Unknown names fall back to
    /// [`OAuthProvider::Google`] rather than failing, so a stale button id
    /// still produces a usable sign-in flow.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "facebook" => Self::Facebook,
            "twitter" => Self::Twitter,
            "github" => Self::Github,
            _ => Self::Google,
        }
    }

    /// The short lowercase name (`"google"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Provider events and subscriptions
// ---------------------------------------------------------------------------

/// A push notification from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The signed-in user changed (`None` = signed out).
    Changed(Option<UserRecord>),
    /// The provider's observer reported an error.
    Error(String),
    /// The provider's observer completed.
    Completed,
}

/// Callback registered with [`IdentityProvider::on_auth_state_changed`].
///
/// The provider may call it from any thread, at any time, including in the
/// middle of an action.
pub type AuthListener = Arc<dyn Fn(AuthEvent) + Send + Sync>;

/// Handle for a registered [`AuthListener`].
///
/// The unsubscribe hook runs at most once: on [`unsubscribe`](Self::unsubscribe)
/// or on drop, whichever comes first.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Releases the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(hook) = self.unsubscribe.take() {
            hook();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Options for the verification email sent after sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSettings {
    /// Where the verification link sends the user back to.
    pub continue_url: Option<String>,
    /// Whether the link should be opened by the app instead of the
    /// provider's hosted page.
    pub handle_code_in_app: bool,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            continue_url: None,
            handle_code_in_app: true,
        }
    }
}

/// Profile fields to update on the current user. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// IdentityProvider
// ---------------------------------------------------------------------------

/// The external identity backend.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → the provider is shared (through an `Arc`)
///   between the coordinator, its listener and every action handle.
/// - Every async method returns a `Send` future, so actions can be spawned
///   onto any Tokio worker.
///
/// Methods that act on "the current user" (`send_email_verification`,
/// `update_profile`) use whichever user the provider last signed in.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Registers a listener for auth state changes.
    ///
    /// The returned [`Subscription`] must release the listener when it is
    /// dropped or unsubscribed.
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription;

    /// The user the provider currently considers signed in.
    fn current_user(&self) -> Option<UserRecord>;

    /// Runs the OAuth popup flow for `provider`.
    fn sign_in_with_popup(
        &self,
        provider: OAuthProvider,
    ) -> impl Future<Output = Result<UserRecord, SessionError>> + Send;

    /// Signs in with a provider-managed email/password account.
    ///
    /// Part of the SDK surface; the coordinator signs in through the login
    /// backend instead.
    fn sign_in_with_email_and_password(
        &self,
        credentials: &SignInCredentials,
    ) -> impl Future<Output = Result<UserRecord, SessionError>> + Send;

    /// Creates a provider account and signs it in.
    fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserRecord, SessionError>> + Send;

    /// Sends a verification email to the current user.
    fn send_email_verification(
        &self,
        settings: &VerificationSettings,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Updates the current user's profile.
    fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Signs the current user out.
    fn sign_out(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_from_name_known_providers() {
        assert_eq!(OAuthProvider::from_name("google"), OAuthProvider::Google);
        assert_eq!(OAuthProvider::from_name("facebook"), OAuthProvider::Facebook);
        assert_eq!(OAuthProvider::from_name("twitter"), OAuthProvider::Twitter);
        assert_eq!(OAuthProvider::from_name("github"), OAuthProvider::Github);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(OAuthProvider::from_name("GitHub"), OAuthProvider::Github);
        assert_eq!(OAuthProvider::from_name(" Twitter "), OAuthProvider::Twitter);
    }

    #[test]
    fn test_from_name_unknown_falls_back_to_google() {
        for name in ["", "apple", "linkedin", "googl", "microsoft"] {
            assert_eq!(OAuthProvider::from_name(name), OAuthProvider::Google, "{name:?}");
        }
    }

    #[test]
    fn test_name_round_trips_through_from_name() {
        for provider in OAuthProvider::ALL {
            assert_eq!(OAuthProvider::from_name(provider.name()), provider);
        }
    }

    #[test]
    fn test_subscription_unsubscribe_runs_hook_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_drop_runs_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_verification_settings_default_handles_code_in_app() {
        assert!(VerificationSettings::default().handle_code_in_app);
    }
}

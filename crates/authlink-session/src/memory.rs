//! A local, in-process identity provider.
//!
//! Behaves like a hosted identity SDK from the coordinator's point of view:
//! accounts keyed by email, popup identities per OAuth provider, a current
//! user, and state-change listeners that fire after every sign-in,
//! sign-up and sign-out. It also lets callers push arbitrary events and
//! inject one-shot failures, which is what tests need.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use authlink_protocol::SignInCredentials;
use rand::Rng;

use crate::{
    AuthEvent, AuthListener, IdentityProvider, OAuthProvider, ProfileUpdate, SessionError,
    Subscription, UserRecord, VerificationSettings,
};

/// Provider operations that can be made to fail with
/// [`InMemoryIdentityProvider::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Popup,
    SignIn,
    CreateUser,
    SendVerification,
    UpdateProfile,
    SignOut,
}

#[derive(Debug, Clone)]
struct Account {
    user: UserRecord,
    password: String,
}

#[derive(Debug, Default)]
struct ProviderState {
    /// Email/password accounts, keyed by lowercase email.
    accounts: HashMap<String, Account>,
    popup_identities: HashMap<OAuthProvider, UserRecord>,
    current: Option<UserRecord>,
    failures: HashMap<Operation, String>,
    popup_requests: Vec<OAuthProvider>,
    verification_mails: Vec<(String, VerificationSettings)>,
}

type Listeners = Mutex<HashMap<u64, AuthListener>>;

/// See the [module docs](self).
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
    listeners: Arc<Listeners>,
    next_listener_id: AtomicU64,
    released: Arc<AtomicUsize>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `user` to a popup provider, so popup sign-in with it succeeds.
    pub fn with_popup_identity(self, provider: OAuthProvider, user: UserRecord) -> Self {
        self.lock().popup_identities.insert(provider, user);
        self
    }

    /// Registers an email/password account and returns its record.
    pub fn add_account(&self, email: &str, password: &str, display_name: Option<&str>) -> UserRecord {
        let mut user = UserRecord::new(generate_uid()).with_email(email);
        user.display_name = display_name.map(str::to_string);
        self.lock().accounts.insert(
            email.to_ascii_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Makes the next call of `operation` fail with `message`.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.lock().failures.insert(operation, message.into());
    }

    /// Pushes an event to every registered listener, as the hosted SDK
    /// would on its own schedule.
    pub fn emit(&self, event: AuthEvent) {
        // Snapshot first: a listener may (un)subscribe while we call it.
        let listeners: Vec<AuthListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        tracing::debug!(listeners = listeners.len(), ?event, "emitting auth event");
        for listener in listeners {
            listener(event.clone());
        }
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// How many subscriptions have been released in total.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Every provider popup sign-in was attempted with, in order.
    pub fn popup_requests(&self) -> Vec<OAuthProvider> {
        self.lock().popup_requests.clone()
    }

    /// Verification emails sent: `(email, settings)`.
    pub fn verification_mails(&self) -> Vec<(String, VerificationSettings)> {
        self.lock().verification_mails.clone()
    }

    /// The stored account record for `email`, reflecting profile updates.
    pub fn account(&self, email: &str) -> Option<UserRecord> {
        self.lock()
            .accounts
            .get(&email.to_ascii_lowercase())
            .map(|a| a.user.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self, operation: Operation) -> Result<(), SessionError> {
        match self.lock().failures.remove(&operation) {
            Some(message) => Err(SessionError::Provider(message)),
            None => Ok(()),
        }
    }

    fn set_current(&self, user: Option<UserRecord>) {
        self.lock().current = user.clone();
        self.emit(AuthEvent::Changed(user));
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);

        let listeners = Arc::clone(&self.listeners);
        let released = Arc::clone(&self.released);
        Subscription::new(move || {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            released.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn current_user(&self) -> Option<UserRecord> {
        self.lock().current.clone()
    }

    async fn sign_in_with_popup(&self, provider: OAuthProvider) -> Result<UserRecord, SessionError> {
        self.lock().popup_requests.push(provider);
        self.take_failure(Operation::Popup)?;

        let user = self
            .lock()
            .popup_identities
            .get(&provider)
            .cloned()
            .ok_or_else(|| SessionError::AuthFailed(format!("no account linked to {provider}")))?;
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in_with_email_and_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserRecord, SessionError> {
        self.take_failure(Operation::SignIn)?;

        let user = {
            let state = self.lock();
            let account = state
                .accounts
                .get(&credentials.email.to_ascii_lowercase())
                .filter(|a| a.password == credentials.password)
                .ok_or_else(|| SessionError::AuthFailed("invalid email or password".into()))?;
            account.user.clone()
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, SessionError> {
        self.take_failure(Operation::CreateUser)?;
        if email.trim().is_empty() || !email.contains('@') {
            return Err(SessionError::Provider(format!("invalid email address: {email:?}")));
        }
        if password.len() < 6 {
            return Err(SessionError::Provider(
                "password should be at least 6 characters".into(),
            ));
        }
        if self.lock().accounts.contains_key(&email.to_ascii_lowercase()) {
            return Err(SessionError::AccountExists(email.to_string()));
        }

        let user = self.add_account(email, password, None);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn send_email_verification(
        &self,
        settings: &VerificationSettings,
    ) -> Result<(), SessionError> {
        self.take_failure(Operation::SendVerification)?;
        let mut state = self.lock();
        let email = state
            .current
            .as_ref()
            .ok_or(SessionError::NoCurrentUser)?
            .email
            .clone()
            .ok_or_else(|| SessionError::Provider("current user has no email".into()))?;
        state.verification_mails.push((email, settings.clone()));
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), SessionError> {
        self.take_failure(Operation::UpdateProfile)?;
        let mut state = self.lock();
        let current = state.current.as_mut().ok_or(SessionError::NoCurrentUser)?;
        if let Some(name) = &update.display_name {
            current.display_name = Some(name.clone());
        }
        let updated = current.clone();
        let key = updated.email.as_deref().map(str::to_ascii_lowercase);
        if let Some(account) = key.and_then(|key| state.accounts.get_mut(&key)) {
            account.user = updated;
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.take_failure(Operation::SignOut)?;
        self.set_current(None);
        Ok(())
    }
}

/// Generates a random 28-character uid, the length hosted providers use.
fn generate_uid() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..28)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_listener() -> (AuthListener, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let listener: AuthListener = Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (listener, hits)
    }

    #[test]
    fn test_generate_uid_is_28_alphanumeric_chars() {
        let uid = generate_uid();
        assert_eq!(uid.len(), 28);
        assert!(uid.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(uid, generate_uid());
    }

    #[test]
    fn test_subscribe_then_release_removes_listener() {
        let provider = InMemoryIdentityProvider::new();
        let (listener, hits) = counting_listener();

        let sub = provider.on_auth_state_changed(listener);
        provider.emit(AuthEvent::Completed);
        sub.unsubscribe();
        provider.emit(AuthEvent::Completed);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(provider.listener_count(), 0);
        assert_eq!(provider.released_count(), 1);
    }

    #[tokio::test]
    async fn test_create_user_signs_in_and_notifies() {
        let provider = InMemoryIdentityProvider::new();
        let (listener, hits) = counting_listener();
        let _sub = provider.on_auth_state_changed(listener);

        let user = provider
            .create_user_with_email_and_password("ada@example.com", "hunter22")
            .await
            .unwrap();

        assert_eq!(provider.current_user(), Some(user));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_returns_account_exists() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_account("ada@example.com", "hunter22", None);

        let result = provider
            .create_user_with_email_and_password("ADA@example.com", "hunter22")
            .await;

        assert!(matches!(result, Err(SessionError::AccountExists(_))));
    }

    #[tokio::test]
    async fn test_create_user_short_password_is_rejected() {
        let provider = InMemoryIdentityProvider::new();

        let result = provider
            .create_user_with_email_and_password("ada@example.com", "123")
            .await;

        assert!(matches!(result, Err(SessionError::Provider(_))));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_returns_auth_failed() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_account("ada@example.com", "hunter22", None);

        let result = provider
            .sign_in_with_email_and_password(&SignInCredentials::new("ada@example.com", "nope"))
            .await;

        assert!(matches!(result, Err(SessionError::AuthFailed(_))));
        assert_eq!(provider.current_user(), None);
    }

    #[tokio::test]
    async fn test_popup_unlinked_provider_returns_auth_failed() {
        let provider = InMemoryIdentityProvider::new();

        let result = provider.sign_in_with_popup(OAuthProvider::Github).await;

        assert!(matches!(result, Err(SessionError::AuthFailed(_))));
        assert_eq!(provider.popup_requests(), vec![OAuthProvider::Github]);
    }

    #[tokio::test]
    async fn test_fail_next_fails_only_once() {
        let provider = InMemoryIdentityProvider::new();
        provider.fail_next(Operation::SignOut, "network down");

        assert!(provider.sign_out().await.is_err());
        assert!(provider.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_without_user_returns_no_current_user() {
        let provider = InMemoryIdentityProvider::new();

        let result = provider
            .update_profile(&ProfileUpdate {
                display_name: Some("Ada".into()),
            })
            .await;

        assert!(matches!(result, Err(SessionError::NoCurrentUser)));
    }

    #[tokio::test]
    async fn test_update_profile_persists_to_account() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .create_user_with_email_and_password("ada@example.com", "hunter22")
            .await
            .unwrap();

        provider
            .update_profile(&ProfileUpdate {
                display_name: Some("Ada".into()),
            })
            .await
            .unwrap();

        let account = provider.account("ada@example.com").unwrap();
        assert_eq!(account.display_name.as_deref(), Some("Ada"));
    }
}

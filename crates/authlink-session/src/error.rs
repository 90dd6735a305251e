//! Error types for the session layer.

/// Errors raised by session collaborators: the identity provider and the
/// durable store.
///
/// The coordinator never returns these to its callers. Each action catches
/// them at its boundary and turns them into an
/// [`ErrorReport`](crate::ErrorReport).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider refused the sign-in: wrong password, unknown
    /// account, popup closed, provider not linked.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An account with this email already exists.
    #[error("an account already exists for {0}")]
    AccountExists(String),

    /// The operation needs a signed-in user and there is none.
    #[error("no user is currently signed in")]
    NoCurrentUser,

    /// Any other identity provider failure (network, quota, internal).
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Reading or writing durable storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

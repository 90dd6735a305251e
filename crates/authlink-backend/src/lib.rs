//! Login backend abstraction for Authlink.
//!
//! Provides the [`LoginBackend`] trait that the session coordinator calls
//! to exchange email/password credentials for an access token, and an
//! HTTP implementation that talks to `POST <base>/auth/login`.
//!
//! # Feature Flags
//!
//! - `http` (default): HTTP backend via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::BackendError;
#[cfg(feature = "http")]
pub use http::{DEFAULT_TIMEOUT, HttpLoginBackend, LOGIN_PATH};

use authlink_protocol::{LoginResponse, SignInCredentials};

/// Exchanges credentials for an access token.
///
/// The returned future must be `Send` so session actions can run on any
/// Tokio worker thread.
pub trait LoginBackend: Send + Sync + 'static {
    /// Sends the credentials to the backend and returns its response.
    ///
    /// A successful call does NOT mean the token is present. Check
    /// [`LoginResponse::token`].
    fn login(
        &self,
        credentials: &SignInCredentials,
    ) -> impl std::future::Future<Output = Result<LoginResponse, BackendError>> + Send;
}

//! Top-level configuration.
//!
//! [`AuthConfig`] gathers everything needed to wire a session together:
//! where the login backend lives, where the token is kept and what the
//! verification email links back to. It can be built in code, loaded with
//! serde, or read from `AUTHLINK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use authlink_backend::DEFAULT_TIMEOUT;
use authlink_session::{SessionConfig, VerificationSettings};
use serde::{Deserialize, Serialize};

pub const ENV_BACKEND_URL: &str = "AUTHLINK_BACKEND_URL";
pub const ENV_TOKEN_KEY: &str = "AUTHLINK_TOKEN_KEY";
pub const ENV_STORE_PATH: &str = "AUTHLINK_STORE_PATH";
pub const ENV_VERIFICATION_URL: &str = "AUTHLINK_VERIFICATION_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AUTHLINK_REQUEST_TIMEOUT_SECS";

/// Default login backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Configuration for an [`AuthProvider`](crate::AuthProvider).
///
/// Missing fields in a serialized config take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the login backend. `/auth/login` is appended.
    ///
    /// Default: `http://localhost:8080`.
    pub backend_url: String,

    /// Storage key for the backend access token.
    ///
    /// Default: `"token"`.
    pub token_key: String,

    /// File the token store is kept in. `None` keeps the token in memory
    /// for the life of the process.
    pub store_path: Option<PathBuf>,

    /// Where the sign-up verification email links back to.
    pub verification_url: Option<String>,

    /// Timeout for each login request.
    ///
    /// Default: 10 seconds.
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            token_key: session.token_key,
            store_path: None,
            verification_url: session.verification.continue_url,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AuthConfig {
    /// Reads overrides from the process environment.
    ///
    /// Unset and empty variables keep their defaults. Invalid values are
    /// logged at `warn` and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = var(ENV_BACKEND_URL) {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.backend_url = url;
            } else {
                tracing::warn!(var = ENV_BACKEND_URL, value = %url, "ignoring non-http backend url");
            }
        }
        if let Some(key) = var(ENV_TOKEN_KEY) {
            config.token_key = key;
        }
        if let Some(path) = var(ENV_STORE_PATH) {
            config.store_path = Some(PathBuf::from(path));
        }
        if let Some(url) = var(ENV_VERIFICATION_URL) {
            config.verification_url = Some(url);
        }
        if let Some(raw) = var(ENV_REQUEST_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        var = ENV_REQUEST_TIMEOUT_SECS,
                        value = %raw,
                        "ignoring invalid request timeout"
                    );
                }
            }
        }
        config
    }

    /// The part of this config the session coordinator needs.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            token_key: self.token_key.clone(),
            verification: VerificationSettings {
                continue_url: self.verification_url.clone(),
                ..VerificationSettings::default()
            },
        }
    }
}

//! HTTP login backend using `reqwest`.

use std::time::Duration;

use authlink_protocol::{Codec, ErrorBody, JsonCodec, LoginResponse, SignInCredentials};
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::{BackendError, LoginBackend};

/// Path of the login route, appended to the configured base URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// Request timeout used by [`HttpLoginBackend::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A [`LoginBackend`] that posts credentials to `<base_url>/auth/login`.
///
/// Cheap to clone: `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct HttpLoginBackend<C: Codec = JsonCodec> {
    client: reqwest::Client,
    login_url: String,
    codec: C,
}

impl HttpLoginBackend<JsonCodec> {
    /// Creates a JSON backend for the given base URL with the default
    /// timeout.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a JSON backend with an explicit request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Self::with_codec(base_url, timeout, JsonCodec)
    }
}

impl<C: Codec> HttpLoginBackend<C> {
    /// Creates a backend with a custom codec.
    ///
    /// Fails with [`BackendError::Client`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn with_codec(base_url: &str, timeout: Duration, codec: C) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        let login_url = format!("{}{LOGIN_PATH}", base_url.trim_end_matches('/'));
        match reqwest::Url::parse(&login_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(BackendError::Client(format!(
                    "unsupported scheme {:?} in backend url",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(BackendError::Client(format!("invalid backend url {base_url:?}: {e}")));
            }
        }
        tracing::debug!(%login_url, "login backend configured");
        Ok(Self {
            client,
            login_url,
            codec,
        })
    }

    /// The full URL credentials are posted to.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

impl<C: Codec> LoginBackend for HttpLoginBackend<C> {
    async fn login(&self, credentials: &SignInCredentials) -> Result<LoginResponse, BackendError> {
        credentials.validate()?;
        let body = self.codec.encode(credentials)?;

        let resp = self
            .client
            .post(&self.login_url)
            .header(CONTENT_TYPE, self.codec.content_type())
            .header(ACCEPT, self.codec.content_type())
            .body(body)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !status.is_success() {
            // The error body is best-effort: a proxy may answer with HTML.
            let message = self
                .codec
                .decode::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.message);
            tracing::debug!(status = status.as_u16(), "login rejected by backend");
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.codec.decode(&bytes)?)
    }
}

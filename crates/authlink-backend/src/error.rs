use authlink_protocol::ProtocolError;

/// Errors that can occur while talking to the login backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed (bad TLS setup, etc.).
    #[error("backend client setup failed: {0}")]
    Client(String),

    /// The request never produced a response: DNS, connect, timeout.
    #[error("login request failed: {0}")]
    Request(String),

    /// The backend answered with a non-2xx status.
    #[error("login rejected with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        /// The `message` field of the backend's error body, if it sent one.
        message: Option<String>,
    },

    /// The request or response body could not be (de)serialized.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl BackendError {
    /// The text to show a user for this failure.
    ///
    /// Prefers the backend's own message over our formatting of it.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

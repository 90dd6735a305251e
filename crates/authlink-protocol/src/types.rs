//! Request and response bodies for the login endpoint.
//!
//! Credentials are transient: they're built from user input, handed to an
//! action, sent once and dropped. Nothing in Authlink persists them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Email/password pair for signing in.
///
/// This is also the exact JSON body of `POST /auth/login`:
///
/// ```json
/// { "email": "ada@example.com", "password": "..." }
/// ```
///
/// `Debug` is implemented by hand so a stray `{:?}` in a log line never
/// prints the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl SignInCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rejects payloads the backend would refuse anyway.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPayload`] if the email or password
    /// is blank.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.email.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload("email is empty".into()));
        }
        if self.password.is_empty() {
            return Err(ProtocolError::InvalidPayload("password is empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Name/email/password triple for creating an account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpCredentials {
    /// Display name written to the new account's profile.
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpCredentials {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignUpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Successful response body of `POST /auth/login`.
///
/// The backend is supposed to return `{ "access_token": "..." }`, but a
/// 200 without the field (or with `null`) does happen, so the field is
/// optional and callers go through [`token()`](Self::token).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl LoginResponse {
    /// Returns the access token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Error body the backend sends with non-2xx responses.
///
/// Only `message` is used. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_present_returns_some() {
        let resp: LoginResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(resp.token(), Some("abc"));
    }

    #[test]
    fn test_token_missing_field_returns_none() {
        let resp: LoginResponse = serde_json::from_str(r#"{"user":"ada"}"#).unwrap();
        assert_eq!(resp.token(), None);
    }

    #[test]
    fn test_token_null_or_empty_returns_none() {
        let null: LoginResponse = serde_json::from_str(r#"{"access_token":null}"#).unwrap();
        let empty: LoginResponse = serde_json::from_str(r#"{"access_token":""}"#).unwrap();
        assert_eq!(null.token(), None);
        assert_eq!(empty.token(), None);
    }

    #[test]
    fn test_error_body_ignores_unknown_fields() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"statusCode":401,"message":"Unauthorized"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_sign_in_debug_redacts_password() {
        let creds = SignInCredentials::new("ada@example.com", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("ada@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_sign_up_debug_redacts_password() {
        let creds = SignUpCredentials::new("Ada", "ada@example.com", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_validate_blank_email_returns_invalid_payload() {
        let creds = SignInCredentials::new("   ", "pw");
        assert!(matches!(creds.validate(), Err(ProtocolError::InvalidPayload(_))));
    }

    #[test]
    fn test_validate_empty_password_returns_invalid_payload() {
        let creds = SignInCredentials::new("ada@example.com", "");
        assert!(matches!(creds.validate(), Err(ProtocolError::InvalidPayload(_))));
    }

    #[test]
    fn test_validate_complete_credentials_ok() {
        assert!(SignInCredentials::new("ada@example.com", "pw").validate().is_ok());
    }
}

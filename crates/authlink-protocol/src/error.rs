//! Error types for the protocol layer.
//!
//! Each crate in Authlink defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization of a login payload,
//! not in the network or the session.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a request body into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a response body into a Rust type).
    ///
    /// Common causes: the backend answered with HTML (a proxy error page),
    /// an empty body, or a JSON shape we don't recognize.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but violates a protocol rule, e.g. an empty
    /// email address in a sign-in request.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

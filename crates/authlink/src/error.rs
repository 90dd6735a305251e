//! Unified error type for Authlink.

use authlink_backend::BackendError;
use authlink_protocol::ProtocolError;
use authlink_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `authlink` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
///
/// Session actions never return errors (they report through the
/// notifier); this type shows up when wiring things together, e.g. an
/// unparseable backend URL in [`AuthProviderBuilder::build`](crate::AuthProviderBuilder::build).
#[derive(Debug, thiserror::Error)]
pub enum AuthlinkError {
    /// A protocol-level error (encode, decode, invalid payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A login backend error (client setup, request, rejection).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A session-level error (identity provider, storage).
    #[error(transparent)]
    Session(#[from] SessionError),
}

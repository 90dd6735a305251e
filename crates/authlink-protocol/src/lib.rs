//! Wire types for Authlink's login endpoint.
//!
//! This crate defines what travels between the client and the remote
//! login backend:
//!
//! - **Types** ([`SignInCredentials`], [`SignUpCredentials`],
//!   [`LoginResponse`], [`ErrorBody`]): request and response bodies.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those bodies are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or sessions. It only knows
//! how to serialize and deserialize the login payloads.
//!
//! ```text
//! Backend (HTTP) → Protocol (LoginResponse) → Session (SessionState)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ErrorBody, LoginResponse, SignInCredentials, SignUpCredentials};

//! The error taxonomy shared by every access-control component.
//!
//! All of these are recoverable conditions surfaced to the caller at the
//! API boundary; none are fatal to the process. `InvalidCredentials`
//! deliberately covers both "unknown email" and "wrong password" so that
//! login responses cannot be used to enumerate accounts.

use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential material, or the presented token/key is invalid or
    /// expired.
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but the caller's role does not satisfy the
    /// operation's required role.
    #[error("insufficient role")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A reset token past its expiry window.
    #[error("reset token expired")]
    Expired,
    /// Duplicate email on registration, or a structural-invariant
    /// violation (e.g. removing the last super-admin).
    #[error("{0}")]
    Conflict(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn conflict(message: impl Into<String>) -> Self {
        AuthError::Conflict(message.into())
    }
}

//! The access gate: resolves a request's credential material to an
//! authenticated identity, then checks it against an operation's required
//! role. Every protected operation in the surrounding system goes through
//! these two steps before its own logic runs.

use crate::directory::Directory;
use crate::error::AuthError;
use crate::roles::Role;
use crate::tokens::generator::API_KEY_PREFIX;
use crate::tokens::{api_key, session};
use crate::AppState;

/// An authenticated caller.
#[derive(Debug, Clone)]
pub enum Identity {
    /// A person with a session, carrying the role read from the directory
    /// at authentication time (so role changes apply on the next request).
    Account { account_id: String, role: Role },
    /// A service authenticated by API key. Keys are issued and managed by
    /// administrators and grant admin-level service access.
    ApiClient { key_id: String },
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Account { role, .. } => *role,
            Identity::ApiClient { .. } => Role::Admin,
        }
    }

    /// The account id, when the caller is a person.
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Identity::Account { account_id, .. } => Some(account_id),
            Identity::ApiClient { .. } => None,
        }
    }
}

/// Resolve an `Authorization` header to an identity.
///
/// Accepts `Bearer <session token>` and `Bearer ak_<api key>`; anything
/// else (including no header at all) is `Unauthenticated`. When the
/// development bypass is configured, every request resolves to the fixed
/// bypass account and a warning is logged.
pub fn authenticate(state: &AppState, authorization: Option<&str>) -> Result<Identity, AuthError> {
    if let Some(subject) = &state.config.auth_bypass_subject {
        tracing::warn!(subject = %subject, "AUTH BYPASS ACTIVE: skipping credential checks");
        let account = state
            .store
            .find_by_id(subject)?
            .ok_or(AuthError::Unauthenticated)?;
        return Ok(Identity::Account {
            account_id: account.id,
            role: account.role,
        });
    }

    let header = authorization.ok_or(AuthError::Unauthenticated)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?
        .trim();

    if token.starts_with(API_KEY_PREFIX) {
        let now = state.clock.now();
        match api_key::authenticate(&state.store, token, now)? {
            Some(record) => Ok(Identity::ApiClient { key_id: record.id }),
            None => Err(AuthError::Unauthenticated),
        }
    } else {
        let now = state.clock.now();
        let idle = state.config.tokens.idle_timeout();
        let session =
            session::validate(&state.store, token, now, idle)?.ok_or(AuthError::Unauthenticated)?;

        // Role comes from the directory, not from any session claim
        let account = state
            .store
            .find_by_id(&session.account_id)?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(Identity::Account {
            account_id: account.id,
            role: account.role,
        })
    }
}

/// The authorization step: `Forbidden` unless the identity's role
/// satisfies the operation's required role.
pub fn require(identity: &Identity, required: Role) -> Result<(), AuthError> {
    if identity.role().authorize(required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

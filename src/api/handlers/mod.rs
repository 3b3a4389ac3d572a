mod accounts;
mod admin;
mod api_keys;
mod auth;

pub use accounts::*;
pub use admin::*;
pub use api_keys::*;
pub use auth::*;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::response::ApiError;
use crate::error::AuthError;
use crate::gate::Identity;
use crate::storage::models::{Account, Session};
use crate::AppState;

/// Resolve the identity to its account record. API-key callers have no
/// account, so operations that act *as* an account refuse them.
pub(super) fn require_account(state: &AppState, identity: &Identity) -> Result<Account, ApiError> {
    let account_id = identity
        .account_id()
        .ok_or_else(|| ApiError::forbidden("This operation requires an account session"))?;

    state
        .store
        .get_account(account_id)
        .map_err(AuthError::from)?
        .ok_or_else(|| ApiError::not_found("account not found"))
}

/// Public view of an account. Never includes credential material.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
    pub id: String,
    pub role: crate::roles::Role,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            created_at: account.created_at,
            display_name: account.display_name,
            email: account.email,
            id: account.id,
            role: account.role,
        }
    }
}

/// Session metadata for listings. The token itself is never echoed back
/// after creation.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            created_at: session.created_at,
            expires_at: session.expires_at,
            last_activity_at: session.last_activity_at,
        }
    }
}

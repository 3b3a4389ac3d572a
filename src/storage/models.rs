use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// An identity record in the account directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Human-readable name shown in listings
    pub display_name: String,
    /// Unique login handle (stored lowercased)
    pub email: String,
    /// Stable UUID identifier; never reissued, even after deletion
    pub id: String,
    /// Current role in the hierarchy
    pub role: Role,
}

/// A bearer session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated account
    pub account_id: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session expires; slides forward on every successful validation
    pub expires_at: DateTime<Utc>,
    /// When the session was last successfully validated
    pub last_activity_at: DateTime<Utc>,
    /// Opaque secret token (32-byte hex)
    pub token: String,
}

/// A single-use, time-boxed password-reset token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    /// The account the reset applies to
    pub account_id: String,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// Email snapshot at issuance, kept for audit
    pub email: String,
    /// When the token expires; never renewed
    pub expires_at: DateTime<Utc>,
    /// Opaque secret token (32-byte hex)
    pub token: String,
}

/// A long-lived API credential. The plaintext key is returned exactly once
/// at issuance; only the salted hash is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// When the key was issued
    pub created_at: DateTime<Utc>,
    /// Human-readable name for the key
    pub display_name: String,
    /// Non-secret UUID identifier (used for listing, revoking)
    pub id: String,
    /// Hex SHA-256 of salt || plaintext key
    pub key_hash: String,
    /// When the key last authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,
    /// Per-key random salt (hex)
    pub salt: String,
}

/// Lifecycle actions recorded in the usage log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Created,
    Revoked,
}

/// An entry in the append-only API-key audit trail. Entries reference the
/// key id and survive revocation of the key record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub action: KeyAction,
    pub key_id: String,
    pub timestamp: DateTime<Utc>,
}

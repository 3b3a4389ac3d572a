//! API-key manager: long-lived credentials independent of the session
//! mechanism. The plaintext key is returned exactly once at issuance and
//! only its salted hash persists; every lifecycle event lands in the
//! append-only usage log, which outlives the key records themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AuthError;
use crate::storage::models::{ApiKey, KeyAction, UsageLogEntry};
use crate::storage::Store;

use super::generator::{generate_api_key, generate_salt, hash_api_key, verify_api_key};

/// The one-time issuance result. `key` is the only copy of the plaintext
/// that will ever exist.
#[derive(Debug)]
pub struct IssuedKey {
    pub id: String,
    pub key: String,
}

/// A masked listing view. The mask exposes only the tail of the stored
/// hash, which reconstructs nothing.
#[derive(Debug, Serialize)]
pub struct ApiKeyView {
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub id: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub masked_key: String,
}

/// Issue a new API key: random plaintext with the `ak_` prefix, salted
/// hash stored, `created` entry appended to the usage log.
pub fn issue(store: &Store, display_name: &str, now: DateTime<Utc>) -> Result<IssuedKey, AuthError> {
    let key = generate_api_key();
    let salt = generate_salt();

    let record = ApiKey {
        created_at: now,
        display_name: display_name.to_string(),
        id: uuid::Uuid::new_v4().to_string(),
        key_hash: hash_api_key(&salt, &key),
        last_used_at: None,
        salt,
    };

    store.put_api_key(&record)?;
    store.append_usage(&record.id, KeyAction::Created, now)?;
    tracing::debug!(key_id = %record.id, display_name = %display_name, "Issued API key");

    Ok(IssuedKey { id: record.id, key })
}

/// List every stored key as a masked view
pub fn list(store: &Store) -> Result<Vec<ApiKeyView>, AuthError> {
    let keys = store.list_api_keys()?;
    Ok(keys.iter().map(to_view).collect())
}

/// Revoke a key permanently and record it in the usage log. Irreversible;
/// fails with `NotFound` for an unknown id.
pub fn revoke(store: &Store, key_id: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
    if !store.delete_api_key(key_id)? {
        return Err(AuthError::NotFound("API key"));
    }
    store.append_usage(key_id, KeyAction::Revoked, now)?;
    tracing::debug!(key_id = %key_id, "Revoked API key");
    Ok(())
}

/// Authenticate a presented plaintext key, touching `last_used_at` on
/// success. Returns None for anything that doesn't verify.
pub fn authenticate(
    store: &Store,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<Option<ApiKey>, AuthError> {
    for record in store.list_api_keys()? {
        if verify_api_key(&record.salt, &record.key_hash, presented) {
            if let Err(e) = store.touch_api_key(&record.id, now) {
                tracing::warn!(error = %e, key_id = %record.id, "Failed to update API key last_used_at");
            }
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Audit trail for one key id, in append order. Entries survive
/// revocation of the key record.
pub fn usage_log(store: &Store, key_id: &str) -> Result<Vec<UsageLogEntry>, AuthError> {
    Ok(store.get_usage_log_for(key_id)?)
}

fn to_view(record: &ApiKey) -> ApiKeyView {
    ApiKeyView {
        created_at: record.created_at,
        display_name: record.display_name.clone(),
        id: record.id.clone(),
        last_used_at: record.last_used_at,
        masked_key: mask(&record.key_hash),
    }
}

/// Display mask: the last 4 characters of the stored hash. Cosmetic only.
fn mask(key_hash: &str) -> String {
    let tail: String = key_hash
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

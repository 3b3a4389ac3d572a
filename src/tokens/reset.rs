//! Reset-token manager: single-use, time-boxed tokens for password
//! recovery, decoupled from session tokens. Delivery to the user is the
//! [`crate::delivery::Delivery`] collaborator's job.

use chrono::{DateTime, Duration, Utc};

use crate::error::AuthError;
use crate::storage::models::ResetToken;
use crate::storage::{ConsumeOutcome, Store};

use super::generator::generate_token;

/// Issue a reset token for an account with a fixed expiry window.
/// The email is snapshotted at issuance for audit.
pub fn issue(
    store: &Store,
    account_id: &str,
    email: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<ResetToken, AuthError> {
    let reset = ResetToken {
        account_id: account_id.to_string(),
        created_at: now,
        email: email.to_string(),
        expires_at: now + ttl,
        token: generate_token(),
    };

    store.put_reset_token(&reset)?;
    tracing::debug!(account_id = %account_id, "Issued password reset token");

    Ok(reset)
}

/// Mirror the cost of `issue` without creating a record: one token
/// generation and one committed write transaction. The unknown-email
/// reset path calls this so response timing does not reveal whether an
/// email is registered.
pub fn issue_decoy(store: &Store) -> Result<(), AuthError> {
    let _ = generate_token();
    store.commit_empty()?;
    Ok(())
}

/// Read-only pre-flight check: true iff the token exists and is unexpired.
/// Does not consume the token.
pub fn validate(store: &Store, token: &str, now: DateTime<Utc>) -> Result<bool, AuthError> {
    match store.get_reset_token(token)? {
        Some(reset) => Ok(now <= reset.expires_at),
        None => Ok(false),
    }
}

/// Consume a token exactly once, returning the account it was issued for.
/// Fails with `NotFound` for an unknown token and `Expired` for one past
/// its window (deleting it as a side effect).
pub fn consume(store: &Store, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
    match store.consume_reset_token(token, now)? {
        ConsumeOutcome::Consumed { account_id } => {
            tracing::debug!(account_id = %account_id, "Consumed password reset token");
            Ok(account_id)
        }
        ConsumeOutcome::Expired => Err(AuthError::Expired),
        ConsumeOutcome::NotFound => Err(AuthError::NotFound("reset token")),
    }
}

/// Clean up expired reset tokens (called by the background cleaner)
pub fn cleanup_expired(store: &Store, now: DateTime<Utc>) -> Result<usize, AuthError> {
    let tokens = store.get_all_reset_tokens()?;
    let mut cleaned = 0;

    for reset in tokens {
        if now > reset.expires_at && store.delete_reset_token(&reset.token)? {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        tracing::info!(count = cleaned, "Cleaned up expired reset tokens");
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_store;
    use chrono::Utc;

    fn ttl() -> Duration {
        Duration::minutes(60)
    }

    #[test]
    fn test_issue_validate_consume_exactly_once() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let reset = issue(&store, "acct-1", "alice@example.com", now, ttl()).unwrap();
        assert_eq!(reset.email, "alice@example.com");
        assert_eq!(reset.expires_at, now + ttl());

        // Pre-flight validation does not consume
        assert!(validate(&store, &reset.token, now).unwrap());
        assert!(validate(&store, &reset.token, now).unwrap());

        let account_id = consume(&store, &reset.token, now).unwrap();
        assert_eq!(account_id, "acct-1");

        // Second consume fails with NotFound
        let err = consume(&store, &reset.token, now).unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
        assert!(!validate(&store, &reset.token, now).unwrap());
    }

    #[test]
    fn test_decoy_stores_nothing() {
        let (store, _temp) = setup_store();
        issue_decoy(&store).unwrap();
        assert!(store.get_all_reset_tokens().unwrap().is_empty());
    }

    #[test]
    fn test_consume_unknown_token() {
        let (store, _temp) = setup_store();
        let err = consume(&store, "deadbeef", Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[test]
    fn test_expired_token_consume_fails_and_deletes() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let reset = issue(&store, "acct-1", "alice@example.com", now, ttl()).unwrap();
        let late = now + Duration::minutes(61);

        assert!(!validate(&store, &reset.token, late).unwrap());
        let err = consume(&store, &reset.token, late).unwrap_err();
        assert!(matches!(err, AuthError::Expired));

        // The expired consume deleted the record; a retry is NotFound
        let err = consume(&store, &reset.token, late).unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[test]
    fn test_cleanup_expired() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        issue(&store, "acct-1", "a@example.com", now - Duration::hours(2), ttl()).unwrap();
        let live = issue(&store, "acct-2", "b@example.com", now, ttl()).unwrap();

        let cleaned = cleanup_expired(&store, now).unwrap();
        assert_eq!(cleaned, 1);
        assert!(validate(&store, &live.token, now).unwrap());
    }
}

//! Session manager: bearer tokens with sliding idle-timeout expiry.
//!
//! A session dies `idle_timeout` after its *last* successful validation,
//! not after creation. Expiry is evaluated lazily on access; the
//! background cleaner sweeps sessions that are never touched again.

use chrono::{DateTime, Duration, Utc};

use crate::error::AuthError;
use crate::storage::models::Session;
use crate::storage::Store;

use super::generator::generate_token;

/// Create a new session for an authenticated account
pub fn create(
    store: &Store,
    account_id: &str,
    now: DateTime<Utc>,
    idle_timeout: Duration,
) -> Result<Session, AuthError> {
    let session = Session {
        account_id: account_id.to_string(),
        created_at: now,
        expires_at: now + idle_timeout,
        last_activity_at: now,
        token: generate_token(),
    };

    store.put_session(&session)?;
    tracing::debug!(account_id = %account_id, "Created session");

    Ok(session)
}

/// Validate a session token. On success the expiry window slides forward
/// from `now`; on expiry the session is removed and `None` is returned.
pub fn validate(
    store: &Store,
    token: &str,
    now: DateTime<Utc>,
    idle_timeout: Duration,
) -> Result<Option<Session>, AuthError> {
    Ok(store.validate_session(token, now, idle_timeout)?)
}

/// Invalidate (log out) a session. Idempotent.
pub fn invalidate(store: &Store, token: &str) -> Result<(), AuthError> {
    let deleted = store.delete_session(token)?;
    if deleted {
        tracing::debug!("Invalidated session");
    }
    Ok(())
}

/// Invalidate every session for an account; used after a password reset to
/// force re-authentication everywhere.
pub fn invalidate_all_for(store: &Store, account_id: &str) -> Result<u64, AuthError> {
    let removed = store.delete_sessions_for(account_id)?;
    if removed > 0 {
        tracing::debug!(account_id = %account_id, count = removed, "Invalidated all sessions for account");
    }
    Ok(removed)
}

/// List the live sessions for an account (expired ones filtered out)
pub fn list_for(
    store: &Store,
    account_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Session>, AuthError> {
    let sessions = store.get_sessions_for(account_id)?;
    Ok(sessions
        .into_iter()
        .filter(|s| s.expires_at > now)
        .collect())
}

/// Clean up expired sessions (called by the background cleaner)
pub fn cleanup_expired(store: &Store, now: DateTime<Utc>) -> Result<usize, AuthError> {
    let sessions = store.get_all_sessions()?;
    let mut cleaned = 0;

    for session in sessions {
        if now >= session.expires_at && store.delete_session(&session.token)? {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        tracing::info!(count = cleaned, "Cleaned up expired sessions");
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_store;
    use chrono::Utc;

    fn idle() -> Duration {
        Duration::minutes(60)
    }

    #[test]
    fn test_create_and_validate_session() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let session = create(&store, "acct-1", now, idle()).unwrap();
        assert_eq!(session.token.len(), 64);
        assert_eq!(session.expires_at, now + idle());

        let validated = validate(&store, &session.token, now, idle()).unwrap();
        assert_eq!(validated.unwrap().account_id, "acct-1");
    }

    #[test]
    fn test_sliding_expiry_extends_on_each_use() {
        let (store, _temp) = setup_store();
        let t0 = Utc::now();

        let session = create(&store, "acct-1", t0, idle()).unwrap();

        // 59 minutes of idleness: still valid, window slides to t1 + 60m
        let t1 = t0 + Duration::minutes(59);
        let validated = validate(&store, &session.token, t1, idle()).unwrap().unwrap();
        assert_eq!(validated.expires_at, t1 + idle());
        assert_eq!(validated.last_activity_at, t1);

        // 59 more minutes after the slide: would be dead under a fixed TTL
        let t2 = t1 + Duration::minutes(59);
        assert!(validate(&store, &session.token, t2, idle()).unwrap().is_some());

        // 60 minutes of idleness after the last use: expired and removed
        let t3 = t2 + Duration::minutes(60) + Duration::minutes(60);
        assert!(validate(&store, &session.token, t3, idle()).unwrap().is_none());
        assert!(store.get_session(&session.token).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_removed_on_access() {
        let (store, _temp) = setup_store();
        let t0 = Utc::now();

        let session = create(&store, "acct-1", t0, idle()).unwrap();
        let late = t0 + Duration::minutes(61);

        assert!(validate(&store, &session.token, late, idle()).unwrap().is_none());
        // Lazy expiry deleted the record
        assert!(store.get_session(&session.token).unwrap().is_none());
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let session = create(&store, "acct-1", now, idle()).unwrap();
        invalidate(&store, &session.token).unwrap();
        invalidate(&store, &session.token).unwrap();

        assert!(validate(&store, &session.token, now, idle()).unwrap().is_none());
    }

    #[test]
    fn test_invalidate_all_for_account() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let s1 = create(&store, "acct-1", now, idle()).unwrap();
        let s2 = create(&store, "acct-1", now, idle()).unwrap();
        let other = create(&store, "acct-2", now, idle()).unwrap();

        let removed = invalidate_all_for(&store, "acct-1").unwrap();
        assert_eq!(removed, 2);

        assert!(validate(&store, &s1.token, now, idle()).unwrap().is_none());
        assert!(validate(&store, &s2.token, now, idle()).unwrap().is_none());
        assert!(validate(&store, &other.token, now, idle()).unwrap().is_some());
    }

    #[test]
    fn test_list_for_filters_expired() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        create(&store, "acct-1", now, idle()).unwrap();
        create(&store, "acct-1", now - Duration::hours(2), idle()).unwrap();

        let live = list_for(&store, "acct-1", now).unwrap();
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        create(&store, "acct-1", now - Duration::hours(2), idle()).unwrap();
        create(&store, "acct-1", now - Duration::hours(3), idle()).unwrap();
        let live = create(&store, "acct-2", now, idle()).unwrap();

        let cleaned = cleanup_expired(&store, now).unwrap();
        assert_eq!(cleaned, 2);
        assert!(store.get_session(&live.token).unwrap().is_some());
    }
}

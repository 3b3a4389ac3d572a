//! Credential store: salted password hashes, one record per account.
//!
//! Hashes are Argon2id in PHC string format, so the per-record salt lives
//! inside the stored string and a fresh salt is drawn on every
//! `set_password`. Verification goes through `argon2::verify_password`,
//! which compares in constant time. The plaintext and the hash never leave
//! this module.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::error::AuthError;
use crate::storage::Store;

/// Hash `plaintext` under a fresh random salt and store it, replacing any
/// prior record for the account.
pub fn set_password(store: &Store, account_id: &str, plaintext: &str) -> Result<(), AuthError> {
    let phc = hash_password(plaintext)?;
    store.put_credential(account_id, &phc)?;
    Ok(())
}

/// Verify a presented password. Returns false both for a mismatch and for
/// a missing record; callers that need anti-enumeration behavior rely on
/// that ambiguity.
pub fn verify(store: &Store, account_id: &str, plaintext: &str) -> Result<bool, AuthError> {
    match store.get_credential(account_id)? {
        Some(phc) => Ok(verify_password(&phc, plaintext)),
        None => Ok(false),
    }
}

/// A syntactically valid Argon2id record for a password nobody knows.
/// Verified against when no credential record exists, so an unknown
/// account costs a full hash computation just like a mismatch does.
const DUMMY_PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Run a verification that is guaranteed to fail, at the same cost as a
/// real one.
pub fn verify_dummy(plaintext: &str) -> bool {
    verify_password(DUMMY_PHC, plaintext)
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Internal(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Internal(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_store;

    #[test]
    fn test_set_then_verify_roundtrip() {
        let (store, _temp) = setup_store();

        set_password(&store, "acct-1", "correct horse").unwrap();
        assert!(verify(&store, "acct-1", "correct horse").unwrap());
        assert!(!verify(&store, "acct-1", "wrong horse").unwrap());
    }

    #[test]
    fn test_dummy_verification_always_fails() {
        assert!(!verify_dummy("anything"));
        assert!(!verify_dummy(""));
    }

    #[test]
    fn test_verify_unknown_account_is_false() {
        let (store, _temp) = setup_store();
        assert!(!verify(&store, "no-such-account", "anything").unwrap());
    }

    #[test]
    fn test_replacement_uses_fresh_salt() {
        let (store, _temp) = setup_store();

        set_password(&store, "acct-1", "same password").unwrap();
        let first = store.get_credential("acct-1").unwrap().unwrap();
        set_password(&store, "acct-1", "same password").unwrap();
        let second = store.get_credential("acct-1").unwrap().unwrap();

        assert_ne!(first, second);
        assert!(verify(&store, "acct-1", "same password").unwrap());
    }

    #[test]
    fn test_reset_replaces_record_wholesale() {
        let (store, _temp) = setup_store();

        set_password(&store, "acct-1", "old password").unwrap();
        set_password(&store, "acct-1", "new password").unwrap();

        assert!(!verify(&store, "acct-1", "old password").unwrap());
        assert!(verify(&store, "acct-1", "new password").unwrap());
    }
}

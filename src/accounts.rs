//! Account operations: registration, login, password reset, role changes
//! and deletion. This is the mutation boundary where the structural
//! invariants live: no operation here may leave the directory without a
//! super-admin, and only a super-admin may hand out elevated roles.

use chrono::{DateTime, Duration, Utc};

use crate::credentials;
use crate::delivery::Delivery;
use crate::directory::Directory;
use crate::error::AuthError;
use crate::roles::Role;
use crate::storage::models::{Account, Session};
use crate::storage::{DeleteOutcome, RoleChangeOutcome, Store};
use crate::tokens::{reset, session};

/// Register a new account with the `User` role and set its password.
/// Fails with `Conflict` if the email is already taken.
pub fn register(
    store: &Store,
    now: DateTime<Utc>,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let email = normalize_email(email);
    let account = Account {
        created_at: now,
        display_name: display_name.to_string(),
        email: email.clone(),
        id: uuid::Uuid::new_v4().to_string(),
        role: Role::User,
    };

    if !store.insert(&account)? {
        return Err(AuthError::conflict("email already registered"));
    }
    credentials::set_password(store, &account.id, password)?;

    tracing::info!(account_id = %account.id, "Registered account");
    Ok(account)
}

/// Authenticate an email/password pair and open a session. An unknown
/// email and a wrong password produce the identical `InvalidCredentials`
/// error, so responses cannot be used to enumerate accounts.
pub fn login(
    store: &Store,
    now: DateTime<Utc>,
    idle_timeout: Duration,
    email: &str,
    password: &str,
) -> Result<(Account, Session), AuthError> {
    let email = normalize_email(email);
    let account = store.find_by_email(&email)?;

    // Run a full verification even without an account so the two failure
    // paths stay indistinguishable.
    let verified = match &account {
        Some(account) => credentials::verify(store, &account.id, password)?,
        None => credentials::verify_dummy(password),
    };

    match account {
        Some(account) if verified => {
            let session = session::create(store, &account.id, now, idle_timeout)?;
            tracing::info!(account_id = %account.id, "Login succeeded");
            Ok((account, session))
        }
        _ => Err(AuthError::InvalidCredentials),
    }
}

/// Request a password reset for an email. Always succeeds with the same
/// observable result whether or not the email matches an account; when it
/// does, a token is issued and handed to the delivery collaborator. The
/// unknown-email path performs the same token generation and commit work
/// so the two cannot be told apart by timing either.
pub fn request_reset(
    store: &Store,
    delivery: &dyn Delivery,
    now: DateTime<Utc>,
    ttl: Duration,
    email: &str,
) -> Result<(), AuthError> {
    let email = normalize_email(email);
    match store.find_by_email(&email)? {
        Some(account) => {
            let token = reset::issue(store, &account.id, &email, now, ttl)?;
            delivery.deliver_reset_token(&email, &token.token);
        }
        None => reset::issue_decoy(store)?,
    }
    Ok(())
}

/// Complete a password reset: consume the token, replace the credential,
/// then invalidate every session for the account.
///
/// Ordering: the credential update commits before session invalidation. A
/// crash in between leaves old sessions live under the new password; they
/// die at the idle timeout, and a fresh reset closes them immediately.
pub fn confirm_reset(
    store: &Store,
    now: DateTime<Utc>,
    token: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let account_id = reset::consume(store, token, now)?;
    credentials::set_password(store, &account_id, new_password)?;
    session::invalidate_all_for(store, &account_id)?;

    tracing::info!(account_id = %account_id, "Password reset completed, all sessions invalidated");
    Ok(())
}

/// Change an account's role on behalf of `actor`.
///
/// Promotion to Admin or SuperAdmin requires a SuperAdmin actor, as does
/// touching an account that currently holds SuperAdmin. Stripping the
/// last SuperAdmin is refused with `Conflict` regardless of the actor.
pub fn change_role(
    store: &Store,
    actor: &Account,
    target_id: &str,
    new_role: Role,
) -> Result<Account, AuthError> {
    let target = store
        .find_by_id(target_id)?
        .ok_or(AuthError::NotFound("account"))?;

    let needs_super_admin = new_role >= Role::Admin || target.role == Role::MAX;
    if needs_super_admin && !actor.role.authorize(Role::MAX) {
        return Err(AuthError::Forbidden);
    }

    match store.change_role(target_id, new_role)? {
        RoleChangeOutcome::Applied(account) => {
            tracing::info!(account_id = %target_id, role = %new_role, "Changed account role");
            Ok(account)
        }
        RoleChangeOutcome::LastSuperAdmin => Err(AuthError::conflict(
            "cannot demote the last super-admin",
        )),
        RoleChangeOutcome::NotFound => Err(AuthError::NotFound("account")),
    }
}

/// Delete an account on behalf of `actor`, cascading to its credential,
/// sessions, and outstanding reset tokens. Deleting a SuperAdmin
/// requires a SuperAdmin actor, and
/// the last SuperAdmin cannot be deleted by anyone, itself included.
pub fn delete(store: &Store, actor: &Account, target_id: &str) -> Result<(), AuthError> {
    let target = store
        .find_by_id(target_id)?
        .ok_or(AuthError::NotFound("account"))?;

    if target.role == Role::MAX && !actor.role.authorize(Role::MAX) {
        return Err(AuthError::Forbidden);
    }

    match store.delete(target_id)? {
        DeleteOutcome::Deleted => {
            tracing::info!(account_id = %target_id, "Deleted account");
            Ok(())
        }
        DeleteOutcome::LastSuperAdmin => Err(AuthError::conflict(
            "cannot delete the last super-admin",
        )),
        DeleteOutcome::NotFound => Err(AuthError::NotFound("account")),
    }
}

/// Update an account's display name
pub fn update_display_name(
    store: &Store,
    target_id: &str,
    display_name: &str,
) -> Result<Account, AuthError> {
    if !Directory::update_display_name(store, target_id, display_name)? {
        return Err(AuthError::NotFound("account"));
    }
    store
        .find_by_id(target_id)?
        .ok_or(AuthError::NotFound("account"))
}

/// Seed the initial super-admin if no account holds the maximal role yet.
/// Returns whether an account was created.
pub fn ensure_bootstrap_admin(
    store: &Store,
    now: DateTime<Utc>,
    email: &str,
    password: &str,
) -> Result<bool, AuthError> {
    if store.count_role(Role::MAX)? > 0 {
        return Ok(false);
    }

    let email = normalize_email(email);
    let account = Account {
        created_at: now,
        display_name: "Administrator".to_string(),
        email,
        id: uuid::Uuid::new_v4().to_string(),
        role: Role::MAX,
    };

    if !store.insert(&account)? {
        return Err(AuthError::conflict(
            "bootstrap admin email already registered without the super-admin role",
        ));
    }
    credentials::set_password(store, &account.id, password)?;

    tracing::warn!(account_id = %account.id, "Bootstrapped initial super-admin account");
    Ok(true)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{setup_store, CapturingDelivery};
    use chrono::Utc;

    fn idle() -> Duration {
        Duration::minutes(60)
    }

    fn super_admin(store: &Store) -> Account {
        ensure_bootstrap_admin(store, Utc::now(), "root@example.com", "root-pw").unwrap();
        store
            .find_by_email("root@example.com")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_register_and_login() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let account = register(&store, now, "Alice@Example.com", "Alice", "pw1").unwrap();
        assert_eq!(account.email, "alice@example.com");
        assert_eq!(account.role, Role::User);

        let (logged_in, session) = login(&store, now, idle(), "alice@example.com", "pw1").unwrap();
        assert_eq!(logged_in.id, account.id);
        assert_eq!(session.account_id, account.id);
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        register(&store, now, "alice@example.com", "Alice", "pw1").unwrap();

        let wrong_pw = login(&store, now, idle(), "alice@example.com", "pw2").unwrap_err();
        let unknown = login(&store, now, idle(), "nobody@example.com", "pw1").unwrap_err();
        assert!(matches!(wrong_pw, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        register(&store, now, "alice@example.com", "Alice", "pw1").unwrap();
        let err = register(&store, now, "ALICE@example.com", "Other", "pw2").unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn test_request_reset_is_silent_for_unknown_email() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let delivery = CapturingDelivery::default();

        register(&store, now, "alice@example.com", "Alice", "pw1").unwrap();

        request_reset(&store, &delivery, now, idle(), "alice@example.com").unwrap();
        request_reset(&store, &delivery, now, idle(), "nobody@example.com").unwrap();

        // Identical success either way; only the known email got a token,
        // and the decoy path stored nothing
        assert_eq!(delivery.sent().len(), 1);
        assert_eq!(delivery.sent()[0].0, "alice@example.com");
        assert_eq!(store.get_all_reset_tokens().unwrap().len(), 1);
    }

    #[test]
    fn test_confirm_reset_invalidates_all_sessions() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let delivery = CapturingDelivery::default();

        let account = register(&store, now, "alice@example.com", "Alice", "pw1").unwrap();
        let (_, s1) = login(&store, now, idle(), "alice@example.com", "pw1").unwrap();
        let (_, s2) = login(&store, now, idle(), "alice@example.com", "pw1").unwrap();

        request_reset(&store, &delivery, now, idle(), "alice@example.com").unwrap();
        let token = delivery.sent()[0].1.clone();

        confirm_reset(&store, now, &token, "pw2").unwrap();

        // Old password is gone, sessions are dead, new password works
        assert!(login(&store, now, idle(), "alice@example.com", "pw1").is_err());
        assert!(session::validate(&store, &s1.token, now, idle()).unwrap().is_none());
        assert!(session::validate(&store, &s2.token, now, idle()).unwrap().is_none());
        let (logged_in, _) = login(&store, now, idle(), "alice@example.com", "pw2").unwrap();
        assert_eq!(logged_in.id, account.id);
    }

    #[test]
    fn test_promotion_requires_super_admin() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let root = super_admin(&store);

        let alice = register(&store, now, "alice@example.com", "Alice", "pw").unwrap();
        let bob = register(&store, now, "bob@example.com", "Bob", "pw").unwrap();

        // Promote alice to admin as super-admin: allowed
        let alice = change_role(&store, &root, &alice.id, Role::Admin).unwrap();
        assert_eq!(alice.role, Role::Admin);

        // An admin may not promote to admin or super-admin
        let err = change_role(&store, &alice, &bob.id, Role::Admin).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
        let err = change_role(&store, &alice, &bob.id, Role::SuperAdmin).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));

        // Nor touch a super-admin at all
        let err = change_role(&store, &alice, &root.id, Role::User).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[test]
    fn test_last_super_admin_cannot_be_demoted_or_deleted() {
        let (store, _temp) = setup_store();
        let root = super_admin(&store);

        let err = change_role(&store, &root, &root.id, Role::User).unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let err = delete(&store, &root, &root.id).unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn test_second_super_admin_unlocks_demotion() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let root = super_admin(&store);

        let alice = register(&store, now, "alice@example.com", "Alice", "pw").unwrap();
        change_role(&store, &root, &alice.id, Role::SuperAdmin).unwrap();

        // Two holders now, so demoting one is fine
        let root_after = change_role(&store, &root, &root.id, Role::Admin).unwrap();
        assert_eq!(root_after.role, Role::Admin);
    }

    #[test]
    fn test_delete_cascades_sessions() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let root = super_admin(&store);

        let alice = register(&store, now, "alice@example.com", "Alice", "pw").unwrap();
        let (_, s) = login(&store, now, idle(), "alice@example.com", "pw").unwrap();

        delete(&store, &root, &alice.id).unwrap();

        assert!(store.find_by_id(&alice.id).unwrap().is_none());
        assert!(session::validate(&store, &s.token, now, idle()).unwrap().is_none());
        assert!(store.get_credential(&alice.id).unwrap().is_none());
        // The email is free again
        assert!(store.find_by_email("alice@example.com").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_outstanding_reset_tokens() {
        let (store, _temp) = setup_store();
        let now = Utc::now();
        let root = super_admin(&store);
        let delivery = CapturingDelivery::default();

        let alice = register(&store, now, "alice@example.com", "Alice", "pw").unwrap();
        request_reset(&store, &delivery, now, idle(), "alice@example.com").unwrap();
        let token = delivery.sent()[0].1.clone();

        delete(&store, &root, &alice.id).unwrap();

        // The token died with the account and no credential comes back
        let err = confirm_reset(&store, now, &token, "new-pw").unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
        assert!(store.get_credential(&alice.id).unwrap().is_none());
        assert!(store.get_all_reset_tokens().unwrap().is_empty());
    }

    #[test]
    fn test_bootstrap_admin_is_idempotent() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        assert!(ensure_bootstrap_admin(&store, now, "root@example.com", "pw").unwrap());
        assert!(!ensure_bootstrap_admin(&store, now, "root@example.com", "pw").unwrap());
        assert_eq!(store.count_role(Role::SuperAdmin).unwrap(), 1);
    }

    #[test]
    fn test_update_display_name() {
        let (store, _temp) = setup_store();
        let now = Utc::now();

        let alice = register(&store, now, "alice@example.com", "Alice", "pw").unwrap();
        let updated = update_display_name(&store, &alice.id, "Alice L.").unwrap();
        assert_eq!(updated.display_name, "Alice L.");

        let err = update_display_name(&store, "missing", "x").unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}

//! The account-directory collaborator interface.
//!
//! The access-control core never assumes a particular account store; it
//! consumes this narrow interface. The embedded [`Store`] implements it,
//! and a deployment with an external user directory can supply its own
//! implementation behind the same seam.

use crate::storage::models::Account;
use crate::storage::{DeleteOutcome, Store, StoreError};

pub trait Directory {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    fn find_by_id(&self, account_id: &str) -> Result<Option<Account>, StoreError>;
    /// Insert a new account; false means the email is already taken.
    fn insert(&self, account: &Account) -> Result<bool, StoreError>;
    /// Replace mutable profile fields; false means the account is unknown.
    fn update_display_name(&self, account_id: &str, display_name: &str)
        -> Result<bool, StoreError>;
    /// Delete an account, cascading to its credential, sessions, and
    /// outstanding reset tokens.
    fn delete(&self, account_id: &str) -> Result<DeleteOutcome, StoreError>;
    fn list(&self) -> Result<Vec<Account>, StoreError>;
}

impl Directory for Store {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.get_account_by_email(email)
    }

    fn find_by_id(&self, account_id: &str) -> Result<Option<Account>, StoreError> {
        self.get_account(account_id)
    }

    fn insert(&self, account: &Account) -> Result<bool, StoreError> {
        self.insert_account(account)
    }

    fn update_display_name(
        &self,
        account_id: &str,
        display_name: &str,
    ) -> Result<bool, StoreError> {
        Store::update_display_name(self, account_id, display_name)
    }

    fn delete(&self, account_id: &str) -> Result<DeleteOutcome, StoreError> {
        self.delete_account(account_id)
    }

    fn list(&self) -> Result<Vec<Account>, StoreError> {
        self.list_accounts()
    }
}

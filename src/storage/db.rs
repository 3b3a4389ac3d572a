use redb::{Database as RedbDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use chrono::{DateTime, Duration, Utc};

use crate::roles::Role;

use super::models::{Account, ApiKey, KeyAction, ResetToken, Session, UsageLogEntry};
use super::tables::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Redb(#[from] redb::Error),
    #[error("Database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
}

/// Outcome of a role change attempted against the structural invariants.
#[derive(Debug)]
pub enum RoleChangeOutcome {
    Applied(Account),
    /// Refused: the change would strip the last holder of the maximal role.
    LastSuperAdmin,
    NotFound,
}

/// Outcome of an account deletion attempted against the structural invariants.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The account, its credential, its sessions, and its outstanding
    /// reset tokens were removed.
    Deleted,
    /// Refused: the account is the last holder of the maximal role.
    LastSuperAdmin,
    NotFound,
}

/// Outcome of consuming a reset token. At most one concurrent consumer can
/// observe `Consumed` for a given token.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed { account_id: String },
    /// The token existed but was past its window; it has been deleted.
    Expired,
    NotFound,
}

/// The embedded table store backing every component. Each operation runs in
/// its own redb transaction, so read-modify-write sequences on a single key
/// are atomic with respect to concurrent callers.
#[derive(Clone)]
pub struct Store {
    db: Arc<RedbDatabase>,
}

impl Store {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("auth-gate.redb");
        let db = RedbDatabase::create(db_path)?;

        // Create tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNT_EMAILS)?;
            let _ = write_txn.open_table(CREDENTIALS)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(ACCOUNT_SESSIONS)?;
            let _ = write_txn.open_table(RESET_TOKENS)?;
            let _ = write_txn.open_table(API_KEYS)?;
            let _ = write_txn.open_table(USAGE_LOG)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========================================================================
    // Account operations
    // ========================================================================

    /// Insert a new account. Returns false (and stores nothing) if the
    /// email is already taken.
    pub fn insert_account(&self, account: &Account) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;
            let taken = emails.get(account.email.as_str())?.is_some();
            if taken {
                false
            } else {
                emails.insert(account.email.as_str(), account.id.as_str())?;
                drop(emails);
                let mut accounts = write_txn.open_table(ACCOUNTS)?;
                let data = bincode::serialize(account)?;
                accounts.insert(account.id.as_str(), data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Get an account by id
    pub fn get_account(&self, account_id: &str) -> Result<Option<Account>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;

        match table.get(account_id)? {
            Some(data) => {
                let account: Account = bincode::deserialize(data.value())?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    /// Get an account by its (lowercased) email
    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(ACCOUNT_EMAILS)?;

        let account_id: Option<String> = emails.get(email)?.map(|v| v.value().to_string());
        drop(emails);

        match account_id {
            Some(id) => {
                let table = read_txn.open_table(ACCOUNTS)?;
                match table.get(id.as_str())? {
                    Some(data) => Ok(Some(bincode::deserialize(data.value())?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Get all accounts
    pub fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;

        let mut accounts = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let account: Account = bincode::deserialize(value.value())?;
            accounts.push(account);
        }

        Ok(accounts)
    }

    /// Count accounts holding the given role
    pub fn count_role(&self, role: Role) -> Result<usize, StoreError> {
        Ok(self
            .list_accounts()?
            .into_iter()
            .filter(|a| a.role == role)
            .count())
    }

    /// Update an account's display name. Returns false if the account is
    /// unknown.
    pub fn update_display_name(
        &self,
        account_id: &str,
        display_name: &str,
    ) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            let account: Option<Account> = match table.get(account_id)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };
            match account {
                Some(mut account) => {
                    account.display_name = display_name.to_string();
                    let data = bincode::serialize(&account)?;
                    table.insert(account_id, data.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Change an account's role, refusing any change that would leave zero
    /// accounts at the maximal role. The count check and the write happen
    /// in a single transaction.
    pub fn change_role(
        &self,
        account_id: &str,
        new_role: Role,
    ) -> Result<RoleChangeOutcome, StoreError> {
        let write_txn = self.db.begin_write()?;

        let (account, max_holders) = {
            let table = write_txn.open_table(ACCOUNTS)?;
            let account: Option<Account> = match table.get(account_id)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };
            let max_holders = count_role_in(&table, Role::MAX)?;
            (account, max_holders)
        };

        let outcome = match account {
            None => RoleChangeOutcome::NotFound,
            Some(mut account) => {
                if account.role == Role::MAX && new_role < Role::MAX && max_holders <= 1 {
                    RoleChangeOutcome::LastSuperAdmin
                } else {
                    account.role = new_role;
                    {
                        let mut table = write_txn.open_table(ACCOUNTS)?;
                        let data = bincode::serialize(&account)?;
                        table.insert(account_id, data.as_slice())?;
                    }
                    RoleChangeOutcome::Applied(account)
                }
            }
        };

        write_txn.commit()?;
        Ok(outcome)
    }

    /// Delete an account together with its credential record, every
    /// session referencing it, and its outstanding reset tokens, in one
    /// transaction. Refused for the last holder of the maximal role.
    pub fn delete_account(&self, account_id: &str) -> Result<DeleteOutcome, StoreError> {
        let write_txn = self.db.begin_write()?;

        let account: Option<Account> = {
            let table = write_txn.open_table(ACCOUNTS)?;
            let account = match table.get(account_id)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };
            account
        };

        let account = match account {
            Some(account) => account,
            None => {
                write_txn.commit()?;
                return Ok(DeleteOutcome::NotFound);
            }
        };

        if account.role == Role::MAX {
            let table = write_txn.open_table(ACCOUNTS)?;
            let holders = count_role_in(&table, Role::MAX)?;
            drop(table);
            if holders <= 1 {
                write_txn.commit()?;
                return Ok(DeleteOutcome::LastSuperAdmin);
            }
        }

        {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            table.remove(account_id)?;
        }
        {
            let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;
            emails.remove(account.email.as_str())?;
        }
        {
            let mut credentials = write_txn.open_table(CREDENTIALS)?;
            credentials.remove(account_id)?;
        }

        // Cascade: drop every session for the account so no live session
        // references a deleted identity.
        let tokens: Vec<String> = {
            let index = write_txn.open_table(ACCOUNT_SESSIONS)?;
            let tokens = match index.get(account_id)? {
                Some(data) => bincode::deserialize(data.value())?,
                None => Vec::new(),
            };
            tokens
        };
        {
            let mut sessions = write_txn.open_table(SESSIONS)?;
            for token in &tokens {
                sessions.remove(token.as_str())?;
            }
        }
        {
            let mut index = write_txn.open_table(ACCOUNT_SESSIONS)?;
            index.remove(account_id)?;
        }

        // Outstanding reset tokens die with the account, so none can ever
        // recreate a credential for a deleted id.
        {
            let mut resets = write_txn.open_table(RESET_TOKENS)?;
            let mut stale = Vec::new();
            for result in resets.iter()? {
                let (key, value) = result?;
                let reset: ResetToken = bincode::deserialize(value.value())?;
                if reset.account_id == account_id {
                    stale.push(key.value().to_string());
                }
            }
            for token in &stale {
                resets.remove(token.as_str())?;
            }
        }

        write_txn.commit()?;
        Ok(DeleteOutcome::Deleted)
    }

    // ========================================================================
    // Credential operations
    // ========================================================================

    /// Store a credential record, replacing any prior record wholesale
    pub fn put_credential(&self, account_id: &str, phc_hash: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            table.insert(account_id, phc_hash)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get the stored credential hash for an account
    pub fn get_credential(&self, account_id: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;
        Ok(table.get(account_id)?.map(|v| v.value().to_string()))
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session token
    pub fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = bincode::serialize(session)?;
            table.insert(session.token.as_str(), data.as_slice())?;

            // Update account_sessions index
            let mut index = write_txn.open_table(ACCOUNT_SESSIONS)?;
            let mut tokens: Vec<String> = match index.get(session.account_id.as_str())? {
                Some(data) => bincode::deserialize(data.value())?,
                None => Vec::new(),
            };

            if !tokens.contains(&session.token) {
                tokens.push(session.token.clone());
                let index_data = bincode::serialize(&tokens)?;
                index.insert(session.account_id.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a session by token
    pub fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(token)? {
            Some(data) => {
                let session: Session = bincode::deserialize(data.value())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Validate a session with sliding expiry, in one transaction:
    /// look the token up, drop it if expired, otherwise push `expires_at`
    /// forward from `now` and record the activity.
    pub fn validate_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
        idle_timeout: Duration,
    ) -> Result<Option<Session>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let session: Option<Session> = match table.get(token)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };

            match session {
                None => None,
                Some(session) if now >= session.expires_at => {
                    // Lazy expiry: first access past the window removes it
                    table.remove(token)?;
                    drop(table);
                    remove_from_session_index(&write_txn, &session.account_id, token)?;
                    None
                }
                Some(mut session) => {
                    session.last_activity_at = now;
                    session.expires_at = now + idle_timeout;
                    let data = bincode::serialize(&session)?;
                    table.insert(token, data.as_slice())?;
                    Some(session)
                }
            }
        };
        write_txn.commit()?;
        Ok(result)
    }

    /// Delete a session token. Idempotent; returns whether it existed.
    pub fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;

        let account_id: Option<String> = {
            let table = write_txn.open_table(SESSIONS)?;
            let account_id = match table.get(token)? {
                Some(data) => {
                    let session: Session = bincode::deserialize(data.value())?;
                    Some(session.account_id)
                }
                None => None,
            };
            account_id
        };

        let deleted = match account_id {
            Some(account_id) => {
                {
                    let mut table = write_txn.open_table(SESSIONS)?;
                    table.remove(token)?;
                }
                remove_from_session_index(&write_txn, &account_id, token)?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Delete every session for an account, returning how many were removed
    pub fn delete_sessions_for(&self, account_id: &str) -> Result<u64, StoreError> {
        let write_txn = self.db.begin_write()?;

        let tokens: Vec<String> = {
            let index = write_txn.open_table(ACCOUNT_SESSIONS)?;
            let tokens = match index.get(account_id)? {
                Some(data) => bincode::deserialize(data.value())?,
                None => Vec::new(),
            };
            tokens
        };

        let mut removed = 0u64;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            for token in &tokens {
                if table.remove(token.as_str())?.is_some() {
                    removed += 1;
                }
            }
        }
        {
            let mut index = write_txn.open_table(ACCOUNT_SESSIONS)?;
            index.remove(account_id)?;
        }

        write_txn.commit()?;
        Ok(removed)
    }

    /// Get all sessions for an account
    pub fn get_sessions_for(&self, account_id: &str) -> Result<Vec<Session>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ACCOUNT_SESSIONS)?;
        let sessions_table = read_txn.open_table(SESSIONS)?;

        let tokens: Vec<String> = match index.get(account_id)? {
            Some(data) => bincode::deserialize(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut sessions = Vec::new();
        for token in tokens {
            if let Some(data) = sessions_table.get(token.as_str())? {
                let session: Session = bincode::deserialize(data.value())?;
                sessions.push(session);
            }
        }

        Ok(sessions)
    }

    /// Get all sessions (for expiration cleanup)
    pub fn get_all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        let mut sessions = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let session: Session = bincode::deserialize(value.value())?;
            sessions.push(session);
        }

        Ok(sessions)
    }

    // ========================================================================
    // Reset-token operations
    // ========================================================================

    /// Store a reset token
    pub fn put_reset_token(&self, reset: &ResetToken) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RESET_TOKENS)?;
            let data = bincode::serialize(reset)?;
            table.insert(reset.token.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a reset token
    pub fn get_reset_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESET_TOKENS)?;

        match table.get(token)? {
            Some(data) => {
                let reset: ResetToken = bincode::deserialize(data.value())?;
                Ok(Some(reset))
            }
            None => Ok(None),
        }
    }

    /// Consume a reset token exactly once. The lookup, expiry check and
    /// deletion happen in a single transaction, so two racing consumers
    /// see exactly one success.
    pub fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, StoreError> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(RESET_TOKENS)?;
            let reset: Option<ResetToken> = match table.get(token)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };

            match reset {
                None => ConsumeOutcome::NotFound,
                Some(reset) => {
                    // Consumed or expired, the record is gone either way
                    table.remove(token)?;
                    if now > reset.expires_at {
                        ConsumeOutcome::Expired
                    } else {
                        ConsumeOutcome::Consumed {
                            account_id: reset.account_id,
                        }
                    }
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Delete a reset token. Returns whether it existed.
    pub fn delete_reset_token(&self, token: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(RESET_TOKENS)?;
            let deleted = table.remove(token)?.is_some();
            deleted
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get all reset tokens (for expiration cleanup)
    pub fn get_all_reset_tokens(&self) -> Result<Vec<ResetToken>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESET_TOKENS)?;

        let mut tokens = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let reset: ResetToken = bincode::deserialize(value.value())?;
            tokens.push(reset);
        }

        Ok(tokens)
    }

    // ========================================================================
    // API-key operations
    // ========================================================================

    /// Store an API key record
    pub fn put_api_key(&self, api_key: &ApiKey) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(API_KEYS)?;
            let data = bincode::serialize(api_key)?;
            table.insert(api_key.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get an API key by id
    pub fn get_api_key(&self, key_id: &str) -> Result<Option<ApiKey>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(API_KEYS)?;

        match table.get(key_id)? {
            Some(data) => {
                let api_key: ApiKey = bincode::deserialize(data.value())?;
                Ok(Some(api_key))
            }
            None => Ok(None),
        }
    }

    /// Get all API keys
    pub fn list_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(API_KEYS)?;

        let mut keys = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let api_key: ApiKey = bincode::deserialize(value.value())?;
            keys.push(api_key);
        }

        Ok(keys)
    }

    /// Delete an API key record permanently. Returns whether it existed.
    pub fn delete_api_key(&self, key_id: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(API_KEYS)?;
            let deleted = table.remove(key_id)?.is_some();
            deleted
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Update an API key's last_used_at (best-effort bookkeeping)
    pub fn touch_api_key(&self, key_id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(API_KEYS)?;
            let api_key: Option<ApiKey> = match table.get(key_id)? {
                Some(data) => Some(bincode::deserialize(data.value())?),
                None => None,
            };
            if let Some(mut api_key) = api_key {
                api_key.last_used_at = Some(now);
                let data = bincode::serialize(&api_key)?;
                table.insert(key_id, data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========================================================================
    // Usage-log operations
    // ========================================================================

    /// Append an entry to the usage log under the next sequence number
    pub fn append_usage(&self, key_id: &str, action: KeyAction, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let entry = UsageLogEntry {
            action,
            key_id: key_id.to_string(),
            timestamp,
        };
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USAGE_LOG)?;
            let next = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let data = bincode::serialize(&entry)?;
            table.insert(next, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get the full usage log in append order
    pub fn get_usage_log(&self) -> Result<Vec<UsageLogEntry>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USAGE_LOG)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let entry: UsageLogEntry = bincode::deserialize(value.value())?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Get usage-log entries for one key id, in append order
    pub fn get_usage_log_for(&self, key_id: &str) -> Result<Vec<UsageLogEntry>, StoreError> {
        Ok(self
            .get_usage_log()?
            .into_iter()
            .filter(|e| e.key_id == key_id)
            .collect())
    }

    /// Begin and commit an empty write transaction. Costs a durable
    /// commit and changes nothing; lets callers equalize the storage cost
    /// of paths that must stay indistinguishable from the outside.
    pub fn commit_empty(&self) -> Result<(), StoreError> {
        self.db.begin_write()?.commit()?;
        Ok(())
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, StoreError> {
        let write_txn = self.db.begin_write()?;
        let mut stats = PurgeStats::default();

        stats.accounts = clear_record_table(&write_txn, ACCOUNTS)?;
        clear_index_table(&write_txn, ACCOUNT_EMAILS)?;
        clear_index_table(&write_txn, CREDENTIALS)?;
        stats.sessions = clear_record_table(&write_txn, SESSIONS)?;
        clear_record_table(&write_txn, ACCOUNT_SESSIONS)?;
        stats.reset_tokens = clear_record_table(&write_txn, RESET_TOKENS)?;
        stats.api_keys = clear_record_table(&write_txn, API_KEYS)?;

        {
            let table = write_txn.open_table(USAGE_LOG)?;
            let keys: Vec<u64> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value()))
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(USAGE_LOG)?;
            for key in keys {
                table.remove(key)?;
                stats.usage_entries += 1;
            }
        }

        write_txn.commit()?;
        Ok(stats)
    }
}

/// Remove one token from an account's session index, dropping the index
/// entry when it empties.
fn remove_from_session_index(
    write_txn: &redb::WriteTransaction,
    account_id: &str,
    token: &str,
) -> Result<(), StoreError> {
    let tokens: Option<Vec<String>> = {
        let index = write_txn.open_table(ACCOUNT_SESSIONS)?;
        let tokens = match index.get(account_id)? {
            Some(data) => Some(bincode::deserialize(data.value())?),
            None => None,
        };
        tokens
    };

    if let Some(mut tokens) = tokens {
        tokens.retain(|t| t != token);
        let mut index = write_txn.open_table(ACCOUNT_SESSIONS)?;
        if tokens.is_empty() {
            index.remove(account_id)?;
        } else {
            let data = bincode::serialize(&tokens)?;
            index.insert(account_id, data.as_slice())?;
        }
    }

    Ok(())
}

/// Count accounts at a role inside an already-open accounts table.
fn count_role_in<T: ReadableTable<&'static str, &'static [u8]>>(
    table: &T,
    role: Role,
) -> Result<usize, StoreError> {
    let mut count = 0;
    for result in table.iter()? {
        let (_, value) = result?;
        let account: Account = bincode::deserialize(value.value())?;
        if account.role == role {
            count += 1;
        }
    }
    Ok(count)
}

fn clear_record_table(
    write_txn: &redb::WriteTransaction,
    def: TableDefinition<&'static str, &'static [u8]>,
) -> Result<u64, StoreError> {
    let table = write_txn.open_table(def)?;
    let keys: Vec<String> = table
        .iter()?
        .map(|r| r.map(|(k, _)| k.value().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    drop(table);

    let mut table = write_txn.open_table(def)?;
    let mut removed = 0u64;
    for key in keys {
        table.remove(key.as_str())?;
        removed += 1;
    }
    Ok(removed)
}

fn clear_index_table(
    write_txn: &redb::WriteTransaction,
    def: TableDefinition<&'static str, &'static str>,
) -> Result<u64, StoreError> {
    let table = write_txn.open_table(def)?;
    let keys: Vec<String> = table
        .iter()?
        .map(|r| r.map(|(k, _)| k.value().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    drop(table);

    let mut table = write_txn.open_table(def)?;
    let mut removed = 0u64;
    for key in keys {
        table.remove(key.as_str())?;
        removed += 1;
    }
    Ok(removed)
}

/// Statistics from a purge operation
#[derive(Debug, Default, serde::Serialize)]
pub struct PurgeStats {
    pub accounts: u64,
    pub api_keys: u64,
    pub reset_tokens: u64,
    pub sessions: u64,
    pub usage_entries: u64,
}

use redb::TableDefinition;

/// Accounts: account_id -> Account (bincode)
pub const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Login-handle index: lowercased email -> account_id
pub const ACCOUNT_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("account_emails");

/// Credential records: account_id -> PHC hash string (salt embedded)
pub const CREDENTIALS: TableDefinition<&str, &str> = TableDefinition::new("credentials");

/// Session tokens: token -> Session (bincode)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Secondary index: account_id -> Vec<token> (for cascading invalidation)
pub const ACCOUNT_SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("account_sessions");

/// Password-reset tokens: token -> ResetToken (bincode)
pub const RESET_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("reset_tokens");

/// API keys: key_id -> ApiKey (bincode)
pub const API_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("api_keys");

/// Append-only key-lifecycle audit trail: sequence_number -> UsageLogEntry (bincode)
pub const USAGE_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("usage_log");

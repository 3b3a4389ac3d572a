//! auth-gate - authentication, session, and role-based access control
//!
//! This crate provides the access-control core consumed by the rest of
//! the backend:
//! - Salted credential storage (Argon2id) with timing-safe verification
//! - Bearer sessions with sliding idle-timeout expiry
//! - Single-use, time-boxed password-reset tokens
//! - A total-order role hierarchy with a single authorization decision
//! - API-key lifecycle (issue, mask, revoke) with an append-only audit log
//! - The composed access gate every protected operation calls first
//! - redb embedded database (ACID, MVCC, crash-safe)
//! - REST API

pub mod accounts;
pub mod api;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod delivery;
pub mod directory;
pub mod error;
pub mod expiration;
pub mod gate;
pub mod roles;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod tokens;

use std::sync::Arc;

use clock::Clock;
use config::Config;
use delivery::Delivery;
use storage::Store;

/// Shared application state
pub struct AppState {
    pub clock: Arc<dyn Clock>,
    pub config: Config,
    pub delivery: Arc<dyn Delivery>,
    pub store: Store,
}

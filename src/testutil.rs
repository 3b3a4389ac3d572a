//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use crate::clock::Clock;
use crate::config::{Config, NodeConfig, TokenConfig};
use crate::delivery::Delivery;
use crate::storage::Store;
use crate::AppState;

/// Open a fresh store in a temporary directory.
///
/// Returns both the `Store` and the `TempDir` guard; the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_store() -> (Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(temp_dir.path()).unwrap();
    (store, temp_dir)
}

/// A minimal `Config` suitable for unit tests.
pub fn test_config() -> Config {
    Config {
        auth_bypass_subject: None,
        bootstrap: None,
        node: NodeConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            data_dir: "/tmp/test".to_string(),
        },
        test_mode: false,
        tokens: TokenConfig::default(),
    }
}

/// Build a full `Arc<AppState>` around a fresh store, with a manual clock
/// and a capturing delivery collaborator.
pub fn test_state() -> (Arc<AppState>, TempDir) {
    let (store, temp_dir) = setup_store();
    let state = Arc::new(AppState {
        clock: Arc::new(ManualClock::new(Utc::now())),
        config: test_config(),
        delivery: Arc::new(CapturingDelivery::default()),
        store,
    });
    (state, temp_dir)
}

/// Clone an `AppState` with the dev bypass pointed at `subject`, sharing
/// the original's store.
pub fn with_bypass(state: &AppState, subject: &str) -> AppState {
    let mut config = state.config.clone();
    config.auth_bypass_subject = Some(subject.to_string());
    AppState {
        clock: Arc::clone(&state.clock),
        config,
        delivery: Arc::clone(&state.delivery),
        store: state.store.clone(),
    }
}

/// A clock tests can move by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Delivery collaborator that records every handoff instead of sending.
#[derive(Default)]
pub struct CapturingDelivery {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingDelivery {
    /// Every `(email, token)` pair delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Delivery for CapturingDelivery {
    fn deliver_reset_token(&self, email: &str, token: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
    }
}

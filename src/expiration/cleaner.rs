use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::tokens::{reset, session};
use crate::AppState;

/// Start the background expiration cleaner task.
///
/// Lazy expiry on access is authoritative; this sweep only reclaims
/// storage held by sessions and reset tokens that are never touched again.
pub fn start_expiration_cleaner(state: Arc<AppState>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.tokens.cleanup_interval_seconds);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);

        loop {
            interval_timer.tick().await;
            run_cleanup(&state).await;
        }
    })
}

async fn run_cleanup(state: &AppState) {
    debug!("Running expiration cleanup");

    let store = state.store.clone();
    let now = state.clock.now();
    let result = tokio::task::spawn_blocking(move || {
        let sessions = session::cleanup_expired(&store, now);
        let resets = reset::cleanup_expired(&store, now);
        (sessions, resets)
    })
    .await;

    let (session_result, reset_result) = match result {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Expiration cleanup task panicked");
            return;
        }
    };

    match session_result {
        Ok(count) if count > 0 => debug!(sessions_cleaned = count, "Expired sessions cleaned"),
        Err(e) => error!(error = %e, "Failed to clean up expired sessions"),
        _ => {}
    }

    match reset_result {
        Ok(count) if count > 0 => debug!(reset_tokens_cleaned = count, "Expired reset tokens cleaned"),
        Err(e) => error!(error = %e, "Failed to clean up expired reset tokens"),
        _ => {}
    }
}

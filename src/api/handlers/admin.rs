use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::response::{ApiError, JSend};
use crate::error::AuthError;
use crate::storage::PurgeStats;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /_internal/health` - liveness probe, unauthenticated.
pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `DELETE /admin/purge` - wipe every table. Only routed when test mode
/// is enabled.
pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeStats>>, ApiError> {
    let stats = state.store.purge_all().map_err(AuthError::from)?;
    tracing::warn!(
        accounts = stats.accounts,
        sessions = stats.sessions,
        api_keys = stats.api_keys,
        "Purged all data"
    );
    Ok(JSend::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.0.data.status, "ok");
        assert!(!response.0.data.version.is_empty());
    }

    #[tokio::test]
    async fn test_purge_wipes_everything() {
        let (state, _temp) = test_state();
        let now = state.clock.now();

        crate::accounts::register(&state.store, now, "alice@example.com", "Alice", "pw").unwrap();
        crate::tokens::api_key::issue(&state.store, "ci", now).unwrap();

        let response = admin_purge(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(response.0.data.accounts, 1);
        assert_eq!(response.0.data.api_keys, 1);

        assert!(state.store.list_accounts().unwrap().is_empty());
        assert!(state.store.list_api_keys().unwrap().is_empty());
    }
}

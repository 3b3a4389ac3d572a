use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::AppState;

use super::handlers;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Authentication and self-service
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/auth/sessions", get(handlers::list_own_sessions))
        // Password reset
        .route("/auth/reset/request", post(handlers::reset_request))
        .route("/auth/reset/validate", post(handlers::reset_validate))
        .route("/auth/reset/confirm", post(handlers::reset_confirm))
        // Account administration
        .route("/accounts", get(handlers::list_accounts))
        .route(
            "/accounts/{id}",
            put(handlers::update_profile).delete(handlers::delete_account),
        )
        .route("/accounts/{id}/role", put(handlers::update_role))
        // API keys
        .route(
            "/api-keys",
            post(handlers::create_api_key).get(handlers::list_api_keys),
        )
        .route("/api-keys/{id}", delete(handlers::revoke_api_key))
        .route("/api-keys/{id}/usage", get(handlers::api_key_usage))
        // Internal
        .route("/_internal/health", get(handlers::health));

    if state.config.test_mode {
        warn!("TEST MODE ENABLED: destructive admin routes are mounted");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

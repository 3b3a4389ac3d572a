use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::extract::CurrentIdentity;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::gate;
use crate::roles::Role;
use crate::storage::models::UsageLogEntry;
use crate::tokens::api_key::{self, ApiKeyView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub display_name: String,
}

/// Issuance response. This is the only place the plaintext key ever
/// appears; it cannot be retrieved again.
#[derive(Debug, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub id: String,
    pub key: String,
}

/// `POST /api-keys`. Admin and above.
pub async fn create_api_key(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    AppJson(body): AppJson<CreateApiKeyRequest>,
) -> Result<Json<JSend<ApiKeyCreatedResponse>>, ApiError> {
    gate::require(&identity, Role::Admin)?;
    if body.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("A display name is required"));
    }

    let now = state.clock.now();
    let issued = api_key::issue(&state.store, body.display_name.trim(), now)?;

    Ok(JSend::success(ApiKeyCreatedResponse {
        id: issued.id,
        key: issued.key,
    }))
}

/// `GET /api-keys` - masked listing. Admin and above.
pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<JSend<Vec<ApiKeyView>>>, ApiError> {
    gate::require(&identity, Role::Admin)?;
    Ok(JSend::success(api_key::list(&state.store)?))
}

/// `DELETE /api-keys/{id}` - irreversible revocation. Admin and above.
pub async fn revoke_api_key(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    gate::require(&identity, Role::Admin)?;

    let now = state.clock.now();
    api_key::revoke(&state.store, &id, now)?;
    Ok(JSend::success(()))
}

/// `GET /api-keys/{id}/usage` - the key's audit trail, which survives
/// revocation. Admin and above.
pub async fn api_key_usage(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<JSend<Vec<UsageLogEntry>>>, ApiError> {
    gate::require(&identity, Role::Admin)?;
    Ok(JSend::success(api_key::usage_log(&state.store, &id)?))
}

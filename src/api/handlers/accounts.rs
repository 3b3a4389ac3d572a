use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::accounts;
use crate::api::extract::CurrentIdentity;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::error::AuthError;
use crate::gate;
use crate::roles::Role;
use crate::AppState;

use super::AccountResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsParams {
    /// Restrict the listing to accounts holding exactly this role.
    pub role: Option<Role>,
}

/// `GET /accounts` - the directory listing, optionally filtered by role.
/// Admin and above.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    AppQuery(params): AppQuery<ListAccountsParams>,
) -> Result<Json<JSend<Vec<AccountResponse>>>, ApiError> {
    gate::require(&identity, Role::Admin)?;

    let accounts = state.store.list_accounts().map_err(AuthError::from)?;
    Ok(JSend::success(
        accounts
            .into_iter()
            .filter(|a| params.role.is_none_or(|role| a.role == role))
            .map(Into::into)
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// `PUT /accounts/{id}/role`. The promotion and last-super-admin rules
/// are enforced in the accounts layer; this handler only authenticates
/// and resolves the actor.
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateRoleRequest>,
) -> Result<Json<JSend<AccountResponse>>, ApiError> {
    gate::require(&identity, Role::Admin)?;
    let actor = super::require_account(&state, &identity)?;

    let updated = accounts::change_role(&state.store, &actor, &id, body.role)?;
    Ok(JSend::success(updated.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

/// `PUT /accounts/{id}` - profile update. Self-service, or Admin for
/// other accounts.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Json<JSend<AccountResponse>>, ApiError> {
    if identity.account_id() != Some(id.as_str()) {
        gate::require(&identity, Role::Admin)?;
    }
    if body.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("A display name is required"));
    }

    let updated = accounts::update_display_name(&state.store, &id, body.display_name.trim())?;
    Ok(JSend::success(updated.into()))
}

/// `DELETE /accounts/{id}`. Admin and above; deleting a super-admin
/// additionally requires a super-admin actor.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    gate::require(&identity, Role::Admin)?;
    let actor = super::require_account(&state, &identity)?;

    accounts::delete(&state.store, &actor, &id)?;
    Ok(JSend::success(()))
}

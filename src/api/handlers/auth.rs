use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::api::extract::{BearerToken, CurrentIdentity};
use crate::api::response::{ApiError, AppJson, JSend};
use crate::tokens::{reset, session};
use crate::AppState;

use super::{AccountResponse, SessionResponse};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login/registration result: the bearer token is returned here and
/// nowhere else.
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub account: AccountResponse,
    pub expires_at: DateTime<Utc>,
    pub token: String,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<Json<JSend<SessionCreatedResponse>>, ApiError> {
    if !body.email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if body.password.is_empty() {
        return Err(ApiError::bad_request("A password is required"));
    }

    let now = state.clock.now();
    let account = accounts::register(
        &state.store,
        now,
        &body.email,
        &body.display_name,
        &body.password,
    )?;
    let session = session::create(
        &state.store,
        &account.id,
        now,
        state.config.tokens.idle_timeout(),
    )?;

    Ok(JSend::success(SessionCreatedResponse {
        account: account.into(),
        expires_at: session.expires_at,
        token: session.token,
    }))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<JSend<SessionCreatedResponse>>, ApiError> {
    let now = state.clock.now();
    let (account, session) = accounts::login(
        &state.store,
        now,
        state.config.tokens.idle_timeout(),
        &body.email,
        &body.password,
    )?;

    Ok(JSend::success(SessionCreatedResponse {
        account: account.into(),
        expires_at: session.expires_at,
        token: session.token,
    }))
}

/// `POST /auth/logout`. Idempotent: succeeds whether or not the token
/// still names a live session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> Result<Json<JSend<()>>, ApiError> {
    session::invalidate(&state.store, &token)?;
    Ok(JSend::success(()))
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<JSend<AccountResponse>>, ApiError> {
    let account = super::require_account(&state, &identity)?;
    Ok(JSend::success(account.into()))
}

/// `GET /auth/sessions` - the caller's own live sessions.
pub async fn list_own_sessions(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<JSend<Vec<SessionResponse>>>, ApiError> {
    let account = super::require_account(&state, &identity)?;
    let now = state.clock.now();
    let sessions = session::list_for(&state.store, &account.id, now)?;

    Ok(JSend::success(
        sessions.into_iter().map(Into::into).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetRequestedResponse {
    pub message: String,
}

/// `POST /auth/reset/request`. Responds identically whether or not the
/// email matches an account.
pub async fn reset_request(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<ResetRequestBody>,
) -> Result<Json<JSend<ResetRequestedResponse>>, ApiError> {
    let now = state.clock.now();
    accounts::request_reset(
        &state.store,
        state.delivery.as_ref(),
        now,
        state.config.tokens.reset_ttl(),
        &body.email,
    )?;

    Ok(JSend::success(ResetRequestedResponse {
        message: "If that email is registered, a reset token has been sent.".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResetValidateBody {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ResetValidateResponse {
    pub valid: bool,
}

/// `POST /auth/reset/validate` - read-only token check, does not consume.
pub async fn reset_validate(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<ResetValidateBody>,
) -> Result<Json<JSend<ResetValidateResponse>>, ApiError> {
    let now = state.clock.now();
    let valid = reset::validate(&state.store, &body.token, now)?;
    Ok(JSend::success(ResetValidateResponse { valid }))
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmBody {
    pub new_password: String,
    pub token: String,
}

/// `POST /auth/reset/confirm` - consumes the token, replaces the
/// credential, and invalidates every session for the account.
pub async fn reset_confirm(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<ResetConfirmBody>,
) -> Result<Json<JSend<()>>, ApiError> {
    if body.new_password.is_empty() {
        return Err(ApiError::bad_request("A new password is required"));
    }

    let now = state.clock.now();
    accounts::confirm_reset(&state.store, now, &body.token, &body.new_password)?;
    Ok(JSend::success(()))
}

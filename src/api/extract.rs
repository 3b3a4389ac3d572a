use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::gate::{self, Identity};
use crate::AppState;

use super::response::ApiError;

/// Extractor that runs the access gate on the `Authorization` header.
/// Handlers that take a `CurrentIdentity` are authenticated; authorization
/// is a separate `gate::require` call inside the handler.
pub struct CurrentIdentity(pub Identity);

impl FromRequestParts<Arc<AppState>> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let identity = gate::authenticate(state, authorization)?;
        Ok(CurrentIdentity(identity))
    }
}

/// The raw bearer token from the `Authorization` header, without running
/// the gate. Used by logout, which must work on the token itself.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        Ok(BearerToken(token))
    }
}

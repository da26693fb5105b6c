//! Bearer-token authentication gate

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::User;

/// Extractor that requires a valid session token for an existing user
///
/// The token is read from `Authorization: Bearer <jwt>`. The caller's identity
/// comes from the token alone, never from the request body.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = state.tokens.validate(&token)?;
        let user_id = claims.user_id()?;

        let user = state
            .store
            .directory()
            .users()
            .get(&user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %user_id, "Token subject no longer exists");
                ApiError::unauthorized("User not found")
            })?;

        Ok(RequireUser(user))
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::unauthorized(
            "Authentication required. Provide 'Authorization: Bearer <token>'",
        ));
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthorized("Authorization scheme must be Bearer")),
    }
}

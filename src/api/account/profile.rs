//! Profile endpoints: read, update and delete the caller's account

use axum::extract::State;
use serde::Deserialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, UserResponse};
use crate::domain::user::UserPatch;

/// Partial update; absent fields are left untouched
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateUserBody> for UserPatch {
    fn from(body: UpdateUserBody) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
        }
    }
}

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.identity.me(user.id()).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /me
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.identity.update_user(user.id(), body.into()).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /me
pub async fn delete_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UserResponse>, ApiError> {
    let deleted = state.identity.delete_user(user.id()).await?;
    Ok(Json(UserResponse::from(&deleted)))
}

//! Authentication API endpoints
//!
//! Signup, login and the two-step password recovery flow. None of these
//! require a session.

use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, MessageResponse, UserResponse};
use crate::infrastructure::user::{AuthSession, SignupRequest};

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub invite_id: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordBody {
    pub password: String,
    pub token: String,
}

/// Session token plus the user it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: UserResponse::from(&session.user),
            jwt: session.jwt,
        }
    }
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state
        .identity
        .signup(SignupRequest {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
            invite_id: body.invite_id,
        })
        .await?;

    Ok(Json(session.into()))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state.identity.login(&body.email, &body.password).await?;
    Ok(Json(session.into()))
}

/// POST /auth/forgot-password
///
/// Always answers with the same acknowledgment.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Json<MessageResponse> {
    Json(MessageResponse::new(
        state.identity.forgot_password(&body.email).await,
    ))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .identity
        .reset_password(&body.password, &body.token)
        .await?;

    Ok(Json(MessageResponse::new(message)))
}

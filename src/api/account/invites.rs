//! Invitation endpoint

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::invite::Invite;
use crate::infrastructure::invite::InviteUserRequest;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteBody {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub inviter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invite> for InviteResponse {
    fn from(invite: &Invite) -> Self {
        Self {
            id: invite.id().to_string(),
            email: invite.email().to_string(),
            first_name: invite.first_name().to_string(),
            last_name: invite.last_name().to_string(),
            inviter_id: invite.inviter_id().to_string(),
            team_id: invite.team_id().map(|id| id.to_string()),
            created_at: invite.created_at(),
        }
    }
}

/// POST /invites
pub async fn invite_user(
    State(state): State<AppState>,
    RequireUser(inviter): RequireUser,
    Json(body): Json<InviteBody>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let invite = state
        .invitations
        .invite_user(
            &inviter,
            InviteUserRequest {
                first_name: body.first_name,
                last_name: body.last_name,
                email: body.email,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(&invite))))
}

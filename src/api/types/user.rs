//! Account representations exposed over HTTP

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::user::User;

/// User as seen by clients; secrets never leave the service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            full_name: user.full_name(),
            email: user.email().to_string(),
            team_id: user.team_id().map(|id| id.to_string()),
            period_start: user.period_start(),
            period_end: user.period_end(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Plain acknowledgment
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

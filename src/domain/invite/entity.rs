//! Invite entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Invite identifier, embedded in signup links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(Uuid);

impl InviteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(id: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(id.trim())
            .map(Self)
            .map_err(|_| DomainError::validation(format!("Invalid invite ID '{}'", id)))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for InviteId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pending onboarding record
///
/// Invites are immutable once created. The team is captured from the inviter
/// at creation time and is what a signup through this invite inherits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    id: InviteId,
    email: String,
    first_name: String,
    last_name: String,
    inviter_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<TeamId>,
    created_at: DateTime<Utc>,
}

impl Invite {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        inviter_id: UserId,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            id: InviteId::generate(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            inviter_id,
            team_id,
            created_at: Utc::now(),
        }
    }

    /// Rebuild an invite from stored fields
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: InviteId,
        email: String,
        first_name: String,
        last_name: String,
        inviter_id: UserId,
        team_id: Option<TeamId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            first_name,
            last_name,
            inviter_id,
            team_id,
            created_at,
        }
    }

    pub fn id(&self) -> &InviteId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn invitee_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn inviter_id(&self) -> &UserId {
        &self.inviter_id
    }

    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_id.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

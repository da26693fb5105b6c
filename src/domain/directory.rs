//! Account directory: the store-facing view of users, teams and invites

use std::sync::Arc;

use tracing::debug;

use super::invite::{InviteId, InviteRepository};
use super::team::{Team, TeamRepository};
use super::user::{User, UserRepository};
use super::DomainError;

/// Composes the user, team and invite repositories and resolves the
/// relations between them.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    invites: Arc<dyn InviteRepository>,
}

impl AccountDirectory {
    pub fn new(
        users: Arc<dyn UserRepository>,
        teams: Arc<dyn TeamRepository>,
        invites: Arc<dyn InviteRepository>,
    ) -> Self {
        Self {
            users,
            teams,
            invites,
        }
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    pub fn invites(&self) -> &dyn InviteRepository {
        self.invites.as_ref()
    }

    /// The team a user belongs to, if any
    ///
    /// A dangling team reference resolves to `None`.
    pub async fn team_of_user(&self, user: &User) -> Result<Option<Team>, DomainError> {
        match user.team_id() {
            Some(team_id) => self.teams.get(team_id).await,
            None => Ok(None),
        }
    }

    /// The team an invite grants, if any
    ///
    /// Unknown invites and invites without a team both resolve to `None`.
    pub async fn team_of_invite(&self, id: &InviteId) -> Result<Option<Team>, DomainError> {
        let Some(invite) = self.invites.get(id).await? else {
            debug!(invite_id = %id, "Invite not found");
            return Ok(None);
        };

        match invite.team_id() {
            Some(team_id) => self.teams.get(team_id).await,
            None => Ok(None),
        }
    }
}

//! PostgreSQL invite repository implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::invite::{Invite, InviteId, InviteRepository};
use crate::domain::team::TeamId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// PostgreSQL implementation of InviteRepository
#[derive(Debug, Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn create(&self, invite: Invite) -> Result<Invite, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO invites (id, email, first_name, last_name, inviter_id, team_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invite.id().as_uuid())
        .bind(invite.email())
        .bind(invite.first_name())
        .bind(invite.last_name())
        .bind(invite.inviter_id().as_uuid())
        .bind(invite.team_id().map(TeamId::as_uuid))
        .bind(invite.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create invite: {}", e)))?;

        Ok(invite)
    }

    async fn get(&self, id: &InviteId) -> Result<Option<Invite>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, first_name, last_name, inviter_id, team_id, created_at
            FROM invites
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get invite: {}", e)))?;

        row.as_ref().map(row_to_invite).transpose()
    }
}

fn row_to_invite(row: &PgRow) -> Result<Invite, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid invite row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column)?;
    let inviter_id: Uuid = row.try_get("inviter_id").map_err(column)?;
    let team_id: Option<Uuid> = row.try_get("team_id").map_err(column)?;

    Ok(Invite::restore(
        InviteId::from(id),
        row.try_get("email").map_err(column)?,
        row.try_get("first_name").map_err(column)?,
        row.try_get("last_name").map_err(column)?,
        UserId::from(inviter_id),
        team_id.map(TeamId::from),
        row.try_get("created_at").map_err(column)?,
    ))
}

//! PostgreSQL team repository implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of TeamRepository
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query("SELECT id, name, created_at FROM teams WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get team: {}", e)))?;

        row.as_ref().map(row_to_team).transpose()
    }
}

fn row_to_team(row: &PgRow) -> Result<Team, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid team row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column)?;
    let name: String = row.try_get("name").map_err(column)?;

    Ok(Team::restore(
        TeamId::from(id),
        name,
        row.try_get("created_at").map_err(column)?,
    ))
}

//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::team::TeamId;
use crate::domain::user::{User, UserChanges, UserId, UserRecord, UserRepository};
use crate::domain::DomainError;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, billing_customer_id, \
     reset_password_token, team_id, period_start, period_end, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
///
/// Email uniqueness is enforced by the `users_email_key` unique index.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, predicate);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("email", email).await
    }

    async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("reset_password_token", token).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash,
                               billing_customer_id, reset_password_token, team_id,
                               period_start, period_end, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.billing_customer_id())
        .bind(user.reset_password_token())
        .bind(user.team_id().map(TeamId::as_uuid))
        .bind(user.period_start())
        .bind(user.period_end())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, Some(user.email()), "create"))?;

        Ok(user)
    }

    async fn apply_changes(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError> {
        // Absent fields bind NULL and fall back to the stored column
        let sql = format!(
            "UPDATE users SET first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), email = COALESCE($4, email), \
             password_hash = COALESCE($5, password_hash), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(changes.first_name.as_deref())
            .bind(changes.last_name.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.password_hash.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, changes.email.as_deref(), "update"))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::not_found(format!("User '{}' not found", id))),
        }
    }

    async fn set_reset_token(&self, id: &UserId, token: &str) -> Result<User, DomainError> {
        let sql = format!(
            "UPDATE users SET reset_password_token = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to set reset token: {}", e)))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::not_found(format!("User '{}' not found", id))),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {}", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, DomainError> {
        // Conditional on the token so concurrent redemptions cannot both win
        let sql = format!(
            "UPDATE users SET password_hash = $2, reset_password_token = NULL, updated_at = NOW() \
             WHERE reset_password_token = $1 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(token)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to redeem reset token: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn write_error(e: sqlx::Error, email: Option<&str>, action: &str) -> DomainError {
    let unique_violation = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique_violation {
        DomainError::conflict(format!("Email '{}' already exists", email.unwrap_or_default()))
    } else {
        DomainError::storage(format!("Failed to {} user: {}", action, e))
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid user row: {}", e));

    let id: Uuid = row.try_get("id").map_err(column)?;
    let team_id: Option<Uuid> = row.try_get("team_id").map_err(column)?;

    Ok(User::restore(UserRecord {
        id: UserId::from(id),
        first_name: row.try_get("first_name").map_err(column)?,
        last_name: row.try_get("last_name").map_err(column)?,
        email: row.try_get("email").map_err(column)?,
        password_hash: row.try_get("password_hash").map_err(column)?,
        billing_customer_id: row.try_get("billing_customer_id").map_err(column)?,
        reset_password_token: row.try_get("reset_password_token").map_err(column)?,
        team_id: team_id.map(TeamId::from),
        period_start: row.try_get("period_start").map_err(column)?,
        period_end: row.try_get("period_end").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
        updated_at: row.try_get("updated_at").map_err(column)?,
    }))
}

//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserChanges, UserId, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<UserId, User>,
    /// Index for email -> user ID lookup
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository
///
/// Both maps live behind one lock so the uniqueness check and the insert
/// happen atomically.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;
        Ok(table.users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .email_index
            .get(email)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .users
            .values()
            .find(|u| u.reset_password_token() == Some(token))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        if table.users.contains_key(user.id()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }

        if table.email_index.contains_key(user.email()) {
            return Err(DomainError::conflict(format!(
                "Email '{}' already exists",
                user.email()
            )));
        }

        table.email_index.insert(user.email().to_string(), *user.id());
        table.users.insert(*user.id(), user.clone());

        Ok(user)
    }

    async fn apply_changes(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        let Some(old_email) = table.users.get(id).map(|u| u.email().to_string()) else {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        };

        if let Some(email) = changes.email.as_deref().filter(|e| *e != old_email) {
            if table.email_index.contains_key(email) {
                return Err(DomainError::conflict(format!("Email '{}' already exists", email)));
            }

            table.email_index.remove(&old_email);
            table.email_index.insert(email.to_string(), *id);
        }

        let user = table
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;
        user.apply_changes(changes);

        Ok(user.clone())
    }

    async fn set_reset_token(&self, id: &UserId, token: &str) -> Result<User, DomainError> {
        let mut table = self.table.write().await;

        let user = table
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;
        user.set_reset_password_token(token);

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let mut table = self.table.write().await;

        let removed = table.users.remove(id);

        if let Some(user) = &removed {
            table.email_index.remove(user.email());
        }

        Ok(removed)
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, DomainError> {
        let mut table = self.table.write().await;

        let Some(user) = table
            .users
            .values_mut()
            .find(|u| u.reset_password_token() == Some(token))
        else {
            return Ok(None);
        };

        user.complete_password_reset(password_hash);

        Ok(Some(user.clone()))
    }
}

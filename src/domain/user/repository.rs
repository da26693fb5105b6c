//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserChanges, UserId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for user storage
///
/// Lookups return `Ok(None)` when nothing matches. Implementations must enforce
/// email uniqueness atomically and report a violation as `DomainError::Conflict`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their normalized email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Get the user holding an outstanding reset token
    async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Write only the fields present in `changes` and return the stored user
    ///
    /// Fails with `NotFound` when the user is gone and `Conflict` when the new
    /// email is taken. Columns not named in `changes` keep their stored values.
    async fn apply_changes(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError>;

    /// Replace the user's outstanding reset token, touching no other field
    async fn set_reset_token(&self, id: &UserId, token: &str) -> Result<User, DomainError>;

    /// Delete a user, returning the removed record
    async fn delete(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Set a new password hash and clear the reset token, but only if `token`
    /// is still the user's outstanding token. Returns `None` when it is not.
    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

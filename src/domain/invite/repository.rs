//! Invite repository trait

use async_trait::async_trait;

use super::entity::{Invite, InviteId};
use crate::domain::DomainError;

/// Repository for invites
#[async_trait]
pub trait InviteRepository: Send + Sync + std::fmt::Debug {
    /// Persist a new invite
    async fn create(&self, invite: Invite) -> Result<Invite, DomainError>;

    /// Get an invite by ID
    async fn get(&self, id: &InviteId) -> Result<Option<Invite>, DomainError>;
}

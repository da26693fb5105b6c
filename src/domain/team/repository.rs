//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId};
use crate::domain::DomainError;

/// Read access to teams; this service never creates or mutates them
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by ID
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError>;
}

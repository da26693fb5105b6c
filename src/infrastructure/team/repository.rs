//! In-memory team repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// In-memory implementation of TeamRepository
///
/// Teams are provisioned elsewhere, so the repository is seeded up front.
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<RwLock<HashMap<TeamId, Team>>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial teams
    pub fn with_teams(teams: Vec<Team>) -> Self {
        let map: HashMap<TeamId, Team> = teams.into_iter().map(|t| (*t.id(), t)).collect();

        Self {
            teams: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let teams = self.teams.read().await;
        Ok(teams.get(id).cloned())
    }
}

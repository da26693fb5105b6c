//! In-memory invite repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::invite::{Invite, InviteId, InviteRepository};
use crate::domain::DomainError;

/// In-memory implementation of InviteRepository
#[derive(Debug, Default)]
pub struct InMemoryInviteRepository {
    invites: Arc<RwLock<HashMap<InviteId, Invite>>>,
}

impl InMemoryInviteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.invites.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.invites.read().await.is_empty()
    }
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepository {
    async fn create(&self, invite: Invite) -> Result<Invite, DomainError> {
        let mut invites = self.invites.write().await;

        if invites.contains_key(invite.id()) {
            return Err(DomainError::conflict(format!(
                "Invite '{}' already exists",
                invite.id()
            )));
        }

        invites.insert(*invite.id(), invite.clone());
        Ok(invite)
    }

    async fn get(&self, id: &InviteId) -> Result<Option<Invite>, DomainError> {
        let invites = self.invites.read().await;
        Ok(invites.get(id).cloned())
    }
}

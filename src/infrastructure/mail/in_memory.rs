//! Outbox mailer that keeps sent emails in memory

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::mail::{Mailer, TemplatedEmail};
use crate::domain::DomainError;

/// Mailer that records every email instead of delivering it
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Vec<TemplatedEmail>>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails sent so far, oldest first
    pub async fn sent(&self) -> Vec<TemplatedEmail> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: TemplatedEmail) -> Result<(), DomainError> {
        debug!(template_id = %email.template_id, "Recording email in outbox");
        self.outbox.write().await.push(email);
        Ok(())
    }
}

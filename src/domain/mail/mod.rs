//! Transactional mail domain

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// An email rendered by the mail provider from a stored template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplatedEmail {
    pub template_id: String,
    pub to: String,
    pub from: String,
    /// Values substituted into the template
    pub data: Value,
}

/// Outbound transactional mail
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, email: TemplatedEmail) -> Result<(), DomainError>;
}

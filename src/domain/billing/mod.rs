//! Billing domain
//!
//! The billing provider owns customers, payment sources, subscriptions and
//! invoices. Accounts only keep the provider's opaque customer id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Invoice as reported by the billing provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Amount due, in the smallest currency unit
    pub amount_due: i64,
    /// Amount paid, in the smallest currency unit
    pub amount_paid: i64,
    pub invoice_pdf: Option<String>,
    pub status: Option<String>,
    pub date: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Third-party billing provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BillingProvider: Send + Sync + Debug {
    /// Create a customer record and return its id
    async fn create_customer(&self, email: &str) -> Result<String, DomainError>;

    /// Remove a customer record (used to undo a failed signup)
    async fn delete_customer(&self, customer_id: &str) -> Result<(), DomainError>;

    /// List all invoices of a customer, newest first
    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, DomainError>;

    /// Attach a tokenized card as the customer's payment source
    async fn attach_card(&self, customer_id: &str, card_token: &str) -> Result<(), DomainError>;

    /// Subscribe the customer to a plan
    async fn subscribe(&self, customer_id: &str, plan_id: &str) -> Result<(), DomainError>;
}

//! In-memory billing provider

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::billing::{BillingProvider, Invoice};
use crate::domain::DomainError;

#[derive(Debug, Clone, Default)]
struct Customer {
    email: String,
    cards: Vec<String>,
    plans: Vec<String>,
    invoices: Vec<Invoice>,
}

/// Billing provider that keeps customers in memory
///
/// Used for local development and tests; no money moves.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingProvider {
    customers: Arc<RwLock<HashMap<String, Customer>>>,
}

impl InMemoryBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn customer_count(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn has_customer(&self, customer_id: &str) -> bool {
        self.customers.read().await.contains_key(customer_id)
    }

    /// Email the customer was created with
    pub async fn customer_email(&self, customer_id: &str) -> Option<String> {
        self.customers
            .read()
            .await
            .get(customer_id)
            .map(|c| c.email.clone())
    }

    /// Plans the customer is subscribed to
    pub async fn plans(&self, customer_id: &str) -> Vec<String> {
        self.customers
            .read()
            .await
            .get(customer_id)
            .map(|c| c.plans.clone())
            .unwrap_or_default()
    }

    /// Card tokens attached to the customer
    pub async fn cards(&self, customer_id: &str) -> Vec<String> {
        self.customers
            .read()
            .await
            .get(customer_id)
            .map(|c| c.cards.clone())
            .unwrap_or_default()
    }

    /// Record an invoice against an existing customer
    pub async fn add_invoice(&self, customer_id: &str, invoice: Invoice) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| no_such_customer(customer_id))?;

        customer.invoices.push(invoice);
        Ok(())
    }
}

fn no_such_customer(customer_id: &str) -> DomainError {
    DomainError::not_found(format!("No such customer: '{}'", customer_id))
}

#[async_trait]
impl BillingProvider for InMemoryBillingProvider {
    async fn create_customer(&self, email: &str) -> Result<String, DomainError> {
        let id = format!("cus_{}", Uuid::new_v4().simple());

        self.customers.write().await.insert(
            id.clone(),
            Customer {
                email: email.to_string(),
                ..Default::default()
            },
        );

        Ok(id)
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), DomainError> {
        self.customers
            .write()
            .await
            .remove(customer_id)
            .map(|_| ())
            .ok_or_else(|| no_such_customer(customer_id))
    }

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, DomainError> {
        let customers = self.customers.read().await;
        let customer = customers
            .get(customer_id)
            .ok_or_else(|| no_such_customer(customer_id))?;

        let mut invoices = customer.invoices.clone();
        invoices.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(invoices)
    }

    async fn attach_card(&self, customer_id: &str, card_token: &str) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| no_such_customer(customer_id))?;

        customer.cards.push(card_token.to_string());
        Ok(())
    }

    async fn subscribe(&self, customer_id: &str, plan_id: &str) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| no_such_customer(customer_id))?;

        customer.plans.push(plan_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn invoice(days_ago: i64) -> Invoice {
        let date = Utc::now() - Duration::days(days_ago);
        Invoice {
            amount_due: 1000,
            amount_paid: 1000,
            invoice_pdf: None,
            status: Some("paid".to_string()),
            date,
            period_start: date - Duration::days(30),
            period_end: date,
        }
    }

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let billing = InMemoryBillingProvider::new();

        let id = billing.create_customer("a@example.com").await.unwrap();
        assert!(id.starts_with("cus_"));
        assert_eq!(billing.customer_email(&id).await.as_deref(), Some("a@example.com"));

        billing.delete_customer(&id).await.unwrap();
        assert_eq!(billing.customer_count().await, 0);
        assert!(billing.delete_customer(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_invoices_newest_first() {
        let billing = InMemoryBillingProvider::new();
        let id = billing.create_customer("a@example.com").await.unwrap();

        billing.add_invoice(&id, invoice(40)).await.unwrap();
        billing.add_invoice(&id, invoice(10)).await.unwrap();

        let invoices = billing.list_invoices(&id).await.unwrap();
        assert_eq!(invoices.len(), 2);
        assert!(invoices[0].date > invoices[1].date);
    }

    #[tokio::test]
    async fn test_card_and_plan() {
        let billing = InMemoryBillingProvider::new();
        let id = billing.create_customer("a@example.com").await.unwrap();

        billing.attach_card(&id, "tok_visa").await.unwrap();
        billing.subscribe(&id, "plan_pro").await.unwrap();

        assert_eq!(billing.cards(&id).await, vec!["tok_visa"]);
        assert_eq!(billing.plans(&id).await, vec!["plan_pro"]);
        assert!(billing.subscribe("cus_missing", "plan_pro").await.is_err());
    }
}

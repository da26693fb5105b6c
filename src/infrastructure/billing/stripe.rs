//! Stripe billing provider

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::billing::{BillingProvider, Invoice};
use crate::domain::DomainError;

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const INVOICE_PAGE_SIZE: &str = "100";

/// Configuration for the Stripe provider
#[derive(Clone)]
pub struct StripeConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[hidden]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeInvoice {
    id: String,
    amount_due: i64,
    amount_paid: i64,
    invoice_pdf: Option<String>,
    status: Option<String>,
    created: i64,
    period_start: i64,
    period_end: i64,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| DomainError::provider("stripe", format!("Invalid timestamp {}", secs)))
}

impl TryFrom<StripeInvoice> for Invoice {
    type Error = DomainError;

    fn try_from(invoice: StripeInvoice) -> Result<Self, Self::Error> {
        Ok(Invoice {
            amount_due: invoice.amount_due,
            amount_paid: invoice.amount_paid,
            invoice_pdf: invoice.invoice_pdf,
            status: invoice.status,
            date: timestamp(invoice.created)?,
            period_start: timestamp(invoice.period_start)?,
            period_end: timestamp(invoice.period_end)?,
        })
    }
}

/// Billing provider backed by the Stripe REST API
#[derive(Debug, Clone)]
pub struct StripeBillingProvider {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeBillingProvider {
    pub fn new(config: StripeConfig) -> Result<Self, DomainError> {
        if config.api_key.is_empty() {
            return Err(DomainError::configuration("Stripe API key is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| DomainError::provider("stripe", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                "stripe",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DomainError> {
        response
            .json()
            .await
            .map_err(|e| DomainError::provider("stripe", format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl BillingProvider for StripeBillingProvider {
    async fn create_customer(&self, email: &str) -> Result<String, DomainError> {
        let request = self
            .client
            .post(self.url("customers"))
            .form(&[("email", email)]);

        let customer: StripeCustomer = Self::parse(self.send(request).await?).await?;
        debug!(customer_id = %customer.id, "Created Stripe customer");

        Ok(customer.id)
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), DomainError> {
        let request = self
            .client
            .delete(self.url(&format!("customers/{}", customer_id)));

        self.send(request).await?;
        debug!(customer_id = %customer_id, "Deleted Stripe customer");

        Ok(())
    }

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<Invoice>, DomainError> {
        let mut invoices = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let page: StripeList<StripeInvoice> = {
                let mut query = vec![("customer", customer_id), ("limit", INVOICE_PAGE_SIZE)];
                if let Some(cursor) = starting_after.as_deref() {
                    query.push(("starting_after", cursor));
                }

                let request = self.client.get(self.url("invoices")).query(&query);
                Self::parse(self.send(request).await?).await?
            };

            let next_cursor = page.data.last().map(|i| i.id.clone());

            for invoice in page.data {
                invoices.push(Invoice::try_from(invoice)?);
            }

            match next_cursor {
                Some(cursor) if page.has_more => starting_after = Some(cursor),
                _ => break,
            }
        }

        Ok(invoices)
    }

    async fn attach_card(&self, customer_id: &str, card_token: &str) -> Result<(), DomainError> {
        let request = self
            .client
            .post(self.url(&format!("customers/{}/sources", customer_id)))
            .form(&[("source", card_token)]);

        self.send(request).await?;
        Ok(())
    }

    async fn subscribe(&self, customer_id: &str, plan_id: &str) -> Result<(), DomainError> {
        let request = self
            .client
            .post(self.url("subscriptions"))
            .form(&[("customer", customer_id), ("items[0][plan]", plan_id)]);

        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> StripeBillingProvider {
        StripeBillingProvider::new(StripeConfig::new("sk_test").with_base_url(server.uri())).unwrap()
    }

    fn stripe_invoice(id: &str, created: i64) -> serde_json::Value {
        json!({
            "id": id,
            "amount_due": 2000,
            "amount_paid": 2000,
            "invoice_pdf": format!("https://pay.example.com/{}.pdf", id),
            "status": "paid",
            "created": created,
            "period_start": created - 86_400,
            "period_end": created,
        })
    }

    #[tokio::test]
    async fn test_create_customer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/customers"))
            .and(header("authorization", "Bearer sk_test"))
            .and(body_string_contains("email=ada%40example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cus_42" })))
            .expect(1)
            .mount(&server)
            .await;

        let id = provider(&server).create_customer("ada@example.com").await.unwrap();
        assert_eq!(id, "cus_42");
    }

    #[tokio::test]
    async fn test_delete_customer() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/customers/cus_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).delete_customer("cus_42").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_invoices_follows_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/invoices"))
            .and(query_param("customer", "cus_42"))
            .and(query_param("starting_after", "in_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [stripe_invoice("in_3", 1_600_000_000)],
                "has_more": false,
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/invoices"))
            .and(query_param("customer", "cus_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    stripe_invoice("in_1", 1_700_000_000),
                    stripe_invoice("in_2", 1_650_000_000),
                ],
                "has_more": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invoices = provider(&server).list_invoices("cus_42").await.unwrap();

        assert_eq!(invoices.len(), 3);
        assert_eq!(invoices[0].amount_paid, 2000);
        assert_eq!(invoices[0].date.timestamp(), 1_700_000_000);
        assert_eq!(invoices[2].status.as_deref(), Some("paid"));
    }

    #[tokio::test]
    async fn test_attach_card_and_subscribe() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/customers/cus_42/sources"))
            .and(body_string_contains("source=tok_visa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "card_1" })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions"))
            .and(body_string_contains("customer=cus_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sub_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let stripe = provider(&server);
        stripe.attach_card("cus_42", "tok_visa").await.unwrap();
        stripe.subscribe("cus_42", "plan_pro").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("card declined"))
            .mount(&server)
            .await;

        let result = provider(&server).attach_card("cus_42", "tok_bad").await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[test]
    fn test_requires_api_key() {
        assert!(StripeBillingProvider::new(StripeConfig::new("")).is_err());
    }
}

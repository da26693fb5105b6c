//! Billing endpoints for the caller's customer record

use axum::extract::State;
use serde::Deserialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, MessageResponse};
use crate::domain::billing::Invoice;

#[derive(Deserialize)]
pub struct AddCreditCardBody {
    /// Card token produced by the billing provider's client library
    pub token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePlanBody {
    pub plan_id: String,
}

/// GET /me/invoices
pub async fn payment_history(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.identity.payment_history(user.id()).await?))
}

/// POST /billing/card
pub async fn add_credit_card(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddCreditCardBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.identity.add_credit_card(user.id(), &body.token).await?;
    Ok(Json(MessageResponse::new(message)))
}

/// POST /billing/subscription
pub async fn subscribe_plan(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<SubscribePlanBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.identity.subscribe_plan(user.id(), &body.plan_id).await?;
    Ok(Json(MessageResponse::new(message)))
}

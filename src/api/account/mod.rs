//! Endpoints acting on the authenticated caller's own account

mod billing;
mod invites;
mod profile;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

pub use invites::{InviteBody, InviteResponse};
pub use profile::UpdateUserBody;

/// Create the router for caller-scoped endpoints
pub fn create_account_router() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(profile::me)
                .patch(profile::update_me)
                .delete(profile::delete_me),
        )
        .route("/me/invoices", get(billing::payment_history))
        .route("/billing/card", post(billing::add_credit_card))
        .route("/billing/subscription", post(billing::subscribe_plan))
        .route("/invites", post(invites::invite_user))
}

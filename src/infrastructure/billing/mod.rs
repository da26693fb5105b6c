//! Billing provider implementations

mod in_memory;
mod stripe;

pub use in_memory::InMemoryBillingProvider;
pub use stripe::{StripeBillingProvider, StripeConfig};

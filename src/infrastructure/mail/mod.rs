//! Mailer implementations

mod in_memory;
mod sendgrid;

pub use in_memory::InMemoryMailer;
pub use sendgrid::{SendgridConfig, SendgridMailer};

//! User infrastructure module
//!
//! Repositories for user accounts and the identity service that drives
//! signup, login, password recovery and self-service account management.

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{
    AuthSession, IdentityService, IdentitySettings, SignupRequest, CARD_UPDATED_MESSAGE,
    FORGOT_PASSWORD_MESSAGE, PASSWORD_UPDATED_MESSAGE, SUBSCRIBED_MESSAGE,
};

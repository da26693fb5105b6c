//! Invite infrastructure: repositories and the invitation service

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresInviteRepository;
pub use repository::InMemoryInviteRepository;
pub use service::{InvitationService, InvitationSettings, InviteUserRequest};

//! Domain layer - Core entities, repository traits and provider contracts

pub mod billing;
pub mod directory;
pub mod error;
pub mod invite;
pub mod mail;
pub mod team;
pub mod user;

pub use billing::{BillingProvider, Invoice};
pub use directory::AccountDirectory;
pub use error::DomainError;
pub use invite::{Invite, InviteId, InviteRepository};
pub use mail::{Mailer, TemplatedEmail};
pub use team::{Team, TeamId, TeamRepository};
pub use user::{User, UserId, UserPatch, UserRepository};

//! Team domain
//!
//! Teams group users for tenancy. They are only referenced here.

mod entity;
mod repository;

pub use entity::{Team, TeamId};
pub use repository::TeamRepository;

//! Invite domain

mod entity;
mod repository;

pub use entity::{Invite, InviteId};
pub use repository::InviteRepository;

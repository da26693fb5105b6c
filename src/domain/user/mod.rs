//! User domain
//!
//! This module provides domain types and traits for user accounts,
//! including user entities, validation, and repository traits.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserChanges, UserId, UserPatch, UserRecord};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_email, validate_name, validate_password, UserValidationError,
};

#[cfg(test)]
pub use repository::MockUserRepository;

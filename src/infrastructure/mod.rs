//! Infrastructure layer - External service implementations

pub mod auth;
pub mod billing;
pub mod invite;
pub mod logging;
pub mod mail;
pub mod storage;
pub mod team;
pub mod user;

//! Authentication infrastructure module
//!
//! Credential hashing, session tokens and password reset tokens.

mod credentials;
mod jwt;
mod reset_token;

pub use credentials::{Argon2Codec, CredentialCodec};
pub use jwt::{JwtConfig, JwtService, SessionClaims, SessionTokenIssuer};
pub use reset_token::{OsResetTokenGenerator, ResetTokenGenerator};

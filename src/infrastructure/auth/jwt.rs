//! Session token issuance and validation (HS256 JWT)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Longest accepted session lifetime (one year)
pub const MAX_TTL_HOURS: u64 = 24 * 365;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub id: String,
    /// User email at issuance time
    pub email: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl SessionClaims {
    /// Create new claims for an identity
    ///
    /// Lifetimes above `MAX_TTL_HOURS` are capped.
    pub fn new(id: &UserId, email: &str, ttl_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(ttl_hours.min(MAX_TTL_HOURS) as i64);

        Self {
            id: id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Parse the user ID from the claims
    pub fn user_id(&self) -> Result<UserId, DomainError> {
        UserId::parse(&self.id)
            .map_err(|_| DomainError::not_authorized("Token subject is not a valid user ID"))
    }
}

/// Configuration for session tokens
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in hours
    pub ttl_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, ttl_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// Mints and checks signed session tokens
pub trait SessionTokenIssuer: Send + Sync + Debug {
    /// Issue a signed token asserting the given identity
    fn issue(&self, id: &UserId, email: &str) -> Result<String, DomainError>;

    /// Validate a token's signature and expiry and return its claims
    fn validate(&self, token: &str) -> Result<SessionClaims, DomainError>;

    /// Token lifetime in hours
    fn ttl_hours(&self) -> u64;
}

/// HS256 JWT implementation over a shared secret
#[derive(Clone)]
pub struct JwtService {
    ttl_hours: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl_hours", &self.ttl_hours)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Result<Self, DomainError> {
        if config.secret.is_empty() {
            return Err(DomainError::configuration("JWT secret must not be empty"));
        }

        if config.ttl_hours == 0 {
            return Err(DomainError::configuration("Token lifetime must be at least one hour"));
        }

        if config.ttl_hours > MAX_TTL_HOURS {
            return Err(DomainError::configuration(format!(
                "Token lifetime must not exceed {} hours",
                MAX_TTL_HOURS
            )));
        }

        Ok(Self {
            ttl_hours: config.ttl_hours,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        })
    }
}

impl SessionTokenIssuer for JwtService {
    fn issue(&self, id: &UserId, email: &str) -> Result<String, DomainError> {
        let claims = SessionClaims::new(id, email, self.ttl_hours);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    fn validate(&self, token: &str) -> Result<SessionClaims, DomainError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::not_authorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }
}

//! Password hashing using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// One-way password hashing and verification
pub trait CredentialCodec: Send + Sync + Debug {
    /// Hash a plaintext password into a self-describing digest
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a plaintext password against a digest
    ///
    /// Malformed digests never match.
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Argon2id codec producing PHC strings
///
/// The digest records its own parameters, so digests produced with a different
/// cost still verify after the cost is changed.
#[derive(Debug, Clone)]
pub struct Argon2Codec {
    params: Params,
}

impl Argon2Codec {
    /// Codec with the crate's recommended interactive parameters
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Codec with explicit cost parameters
    ///
    /// `memory_kib` is the memory cost, `iterations` the time cost and
    /// `parallelism` the lane count.
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| DomainError::configuration(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCodec for Argon2Codec {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_codec() -> Argon2Codec {
        Argon2Codec::with_cost(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let codec = fast_codec();
        let digest = codec.hash("correct horse battery staple").unwrap();

        assert!(codec.verify("correct horse battery staple", &digest));
        assert!(!codec.verify("Correct horse battery staple", &digest));
    }

    #[test]
    fn test_digest_is_self_describing() {
        let digest = fast_codec().hash("password123").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("password123"));
    }

    #[test]
    fn test_salted_digests_differ() {
        let codec = fast_codec();
        let first = codec.hash("password123").unwrap();
        let second = codec.hash("password123").unwrap();

        assert_ne!(first, second);
        assert!(codec.verify("password123", &first));
        assert!(codec.verify("password123", &second));
    }

    #[test]
    fn test_verify_across_cost_change() {
        let digest = fast_codec().hash("password123").unwrap();
        let stronger = Argon2Codec::with_cost(2048, 2, 1).unwrap();

        assert!(stronger.verify("password123", &digest));
    }

    #[test]
    fn test_malformed_digest_never_matches() {
        let codec = fast_codec();

        assert!(!codec.verify("password", "invalid_hash_format"));
        assert!(!codec.verify("password", ""));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(Argon2Codec::with_cost(1, 0, 0).is_err());
    }

    #[test]
    fn test_default_params() {
        let codec = Argon2Codec::default();
        let digest = codec.hash("").unwrap();
        assert!(codec.verify("", &digest));
    }
}

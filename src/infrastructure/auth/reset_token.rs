//! Password reset token generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use std::fmt::Debug;

/// Number of random bytes in a reset token (128 bits)
const RESET_TOKEN_BYTES: usize = 16;

/// Produces opaque single-use tokens for password recovery
pub trait ResetTokenGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;
}

/// Reset tokens drawn from the operating system's RNG
#[derive(Debug, Clone, Default)]
pub struct OsResetTokenGenerator;

impl OsResetTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ResetTokenGenerator for OsResetTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

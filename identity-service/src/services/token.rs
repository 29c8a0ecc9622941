//! Opaque magic link tokens and their at-rest hashes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    /// Generate a fresh token: 32 bytes from the OS CSPRNG, base64url without
    /// padding (43 characters).
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// SHA-256 of the token's UTF-8 bytes, base64url without padding.
    pub fn hash(&self, token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

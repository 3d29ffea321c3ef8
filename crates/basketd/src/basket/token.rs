//! Authentication tokens.
//!
//! A basket token is generated exactly once when the basket is created.
//! Only a SHA-256 digest is kept; the cleartext leaves the process in
//! the create response and is never recoverable afterwards. Comparison
//! goes through `subtle` so that a mismatching token takes the same
//! time as a matching one.

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Entropy of a generated token, in bytes.
const TOKEN_BYTES: usize = 24;

/// Generate a new random token in printable form.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 digest of a token, the only form kept at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    pub fn of(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        Self(digest.into())
    }

    /// Constant-time check of a presented token against the stored hash.
    pub fn matches(&self, candidate: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.0.as_slice().ct_eq(digest.as_slice()).into()
    }
}

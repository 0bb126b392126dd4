//! API key and session token utilities
//!
//! Both credential kinds are 32 random bytes from the OS CSPRNG, encoded as
//! URL-safe base64 without padding. API keys are only ever persisted as an
//! HMAC-SHA256 digest keyed by the server secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::core::constants::{SESSION_TTL_MS, TOKEN_RANDOM_BYTES};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

fn random_token() -> Result<String, CredentialError> {
    let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate the plaintext of a new API key
pub fn generate_api_key() -> Result<String, CredentialError> {
    random_token()
}

/// Generate a new auth session id
pub fn generate_session_token() -> Result<String, CredentialError> {
    random_token()
}

/// HMAC-SHA256 of the key with the server secret (hex encoded)
pub fn hash_api_key(key: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(key.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Absolute expiry (epoch ms) of a session created or extended at `now_ms`
pub fn session_expiry(now_ms: i64) -> i64 {
    now_ms + SESSION_TTL_MS
}

/// Constant-time string comparison
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

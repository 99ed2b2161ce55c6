use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const HASH_ROUNDS: u32 = 10_000;

/// Fresh 16-byte salt, hex encoded.
pub fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Iterated HMAC-SHA256 keyed by the salt. Returns the hex digest.
pub fn hash_password(password: &str, salt: &str) -> AppResult<String> {
    let mut digest = password.as_bytes().to_vec();
    for _ in 0..HASH_ROUNDS {
        let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
            .map_err(|e| AppError::Internal(format!("HMAC error: {e}")))?;
        mac.update(&digest);
        digest = mac.finalize().into_bytes().to_vec();
    }
    Ok(hex::encode(digest))
}

pub fn verify_password(password: &str, salt: &str, expected_hex: &str) -> AppResult<bool> {
    let candidate = hash_password(password, salt)?;
    Ok(constant_time_eq(candidate.as_bytes(), expected_hex.as_bytes()))
}

/// Random 32-byte bearer token, hex encoded.
pub fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// sessions table only ever sees this digest
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

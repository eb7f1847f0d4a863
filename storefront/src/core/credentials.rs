//! Password hashing and constant-time digest comparison
//!
//! Stored form is `hex(salt)$hex(digest)` where the digest is SHA-256 iterated
//! over `salt || password`.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{StorefrontError, StorefrontResult};

const SALT_LEN: usize = 16;
const ITERATIONS: u32 = 10_000;
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), hex::encode(digest(&salt, password)))
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    constant_time_eq(&digest(&salt, password), &expected)
}

pub fn validate_password(password: &str) -> StorefrontResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(StorefrontError::invalid(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Compare without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut out = hasher.finalize();

    for _ in 1..ITERATIONS {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(out);
        out = hasher.finalize();
    }
    out.to_vec()
}

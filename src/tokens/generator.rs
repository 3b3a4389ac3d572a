use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Prefix carried by every issued API key. Makes leaked keys easy to spot
/// in logs and lets the gate route credential material without guessing.
pub const API_KEY_PREFIX: &str = "ak_";

/// Generate a secure random token (32 bytes, hex encoded = 64 characters)
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Generate a secure random API key with the recognizable prefix
pub fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 24] = rng.gen();
    format!("{API_KEY_PREFIX}{}", hex::encode(bytes))
}

/// Generate a random per-key salt (16 bytes, hex encoded)
pub fn generate_salt() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Hash an API key under its salt: hex(SHA-256(salt || key))
pub fn hash_api_key(salt: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the salted hash for a presented key and compare it against
/// the stored hash in constant time.
pub fn verify_api_key(salt: &str, stored_hash: &str, presented: &str) -> bool {
    let computed = hash_api_key(salt, presented);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate `nbytes` of OS randomness, base64url-encoded without padding.
///
/// `OsRng` aborts (panics) if the operating system cannot supply entropy;
/// there is deliberately no fallback to a weaker source.
pub fn generate_token(nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// One-way hash for secret storage. Lowercase SHA-256 hex.
pub fn hash_secret(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a candidate secret against a stored hash in constant time.
pub fn secret_matches(candidate: &str, expected_hash: &str) -> bool {
    let candidate_hash = hash_secret(candidate);
    candidate_hash.as_bytes().ct_eq(expected_hash.as_bytes()).into()
}

/// Constant-time equality for derived values of equal trust (e.g. a computed
/// PKCE challenge against the stored one).
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

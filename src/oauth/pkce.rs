use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::security::constant_time_eq;

/// PKCE challenge method (RFC 7636 §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeMethod {
    S256,
    Plain,
}

impl ChallengeMethod {
    /// An absent method defaults to S256; anything other than the literal
    /// "S256" is compared as plain text, matching RFC 7636's fallback.
    pub fn parse(method: Option<&str>) -> Self {
        match method {
            None | Some("S256") => ChallengeMethod::S256,
            Some(_) => ChallengeMethod::Plain,
        }
    }
}

/// A code challenge captured at authorize time and checked at exchange time,
/// binding the exchange to whoever initiated the authorize request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge {
    challenge: String,
    method: ChallengeMethod,
}

impl CodeChallenge {
    pub fn new(challenge: String, method: Option<&str>) -> Self {
        Self {
            challenge,
            method: ChallengeMethod::parse(method),
        }
    }

    /// True iff the verifier reproduces the stored challenge. A missing or
    /// empty verifier when a challenge was stored is itself a failure.
    pub fn verify(&self, verifier: &str) -> bool {
        if verifier.is_empty() {
            return false;
        }
        match self.method {
            ChallengeMethod::S256 => {
                let digest = Sha256::digest(verifier.as_bytes());
                let computed = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
                constant_time_eq(&computed, &self.challenge)
            }
            ChallengeMethod::Plain => constant_time_eq(verifier, &self.challenge),
        }
    }
}

/// Derive the S256 challenge for a verifier. Used by tests and by clients
/// driving the flow against this server.
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

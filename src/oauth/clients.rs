use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;

use crate::security::{generate_token, hash_secret, secret_matches};

/// A registered OAuth client. Only the hash of the secret is kept; the
/// plaintext leaves the registry exactly once, inside [`CreatedClient`].
#[derive(Debug, Clone, Serialize)]
pub struct OAuthClient {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret_hash: String,
    pub name: String,
    pub redirect_uris: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl OAuthClient {
    /// Exact-match allow-list check; no prefix or wildcard matching.
    pub fn redirect_uri_allowed(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

/// Returned once from [`ClientRegistry::create_client`]. The secret is not
/// retrievable again afterwards.
#[derive(Debug, Clone)]
pub struct CreatedClient {
    pub client: OAuthClient,
    pub client_secret: String,
}

/// In-memory registry of OAuth clients, shared across requests.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, OAuthClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_client(&self, name: &str, redirect_uris: Vec<String>) -> CreatedClient {
        let client_id = format!("ucp_{}", generate_token(16));
        let client_secret = format!("ucp_secret_{}", generate_token(24));
        let client = OAuthClient {
            client_id: client_id.clone(),
            client_secret_hash: hash_secret(&client_secret),
            name: name.to_string(),
            redirect_uris,
            created_at: OffsetDateTime::now_utc(),
        };
        self.clients.write().insert(client_id.clone(), client.clone());
        tracing::info!(client_id = %client_id, name = %name, "oauth client created");
        CreatedClient { client, client_secret }
    }

    pub fn get_client(&self, client_id: &str) -> Option<OAuthClient> {
        self.clients.read().get(client_id).cloned()
    }

    /// True iff the client exists and the secret hashes to the stored hash.
    ///
    /// Unknown client and wrong secret take the same path: the candidate is
    /// hashed and compared (against a dummy hash when the client is missing)
    /// before the existence bit is folded in, so neither timing nor the
    /// outcome distinguishes the two cases.
    pub fn authenticate_client(&self, client_id: &str, client_secret: &str) -> bool {
        let stored = self
            .clients
            .read()
            .get(client_id)
            .map(|c| c.client_secret_hash.clone());
        let exists = stored.is_some();
        let expected = stored.unwrap_or_else(|| hash_secret("ucp_secret_nonexistent"));
        secret_matches(client_secret, &expected) & exists
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_client_authenticates_with_its_secret_only() {
        let registry = ClientRegistry::new();
        let created = registry.create_client("Demo", vec!["https://app.example/cb".into()]);

        assert!(registry.authenticate_client(&created.client.client_id, &created.client_secret));
        assert!(!registry.authenticate_client(&created.client.client_id, "not-the-secret"));
        assert!(!registry.authenticate_client(&created.client.client_id, ""));
    }

    #[test]
    fn unknown_client_fails_like_a_wrong_secret() {
        let registry = ClientRegistry::new();
        assert!(!registry.authenticate_client("ucp_missing", "anything"));
        assert!(!registry.authenticate_client("ucp_missing", ""));
        // even the dummy hash's preimage must not authenticate a missing client
        assert!(!registry.authenticate_client("ucp_missing", "ucp_secret_nonexistent"));
    }

    #[test]
    fn stored_record_holds_only_the_hash() {
        let registry = ClientRegistry::new();
        let created = registry.create_client("Demo", vec![]);
        let stored = registry.get_client(&created.client.client_id).unwrap();
        assert_ne!(stored.client_secret_hash, created.client_secret);
        assert_eq!(stored.client_secret_hash, crate::security::hash_secret(&created.client_secret));
    }

    #[test]
    fn redirect_uris_are_exact_match() {
        let registry = ClientRegistry::new();
        let created = registry.create_client("Demo", vec!["https://app.example/cb".into()]);
        let client = created.client;
        assert!(client.redirect_uri_allowed("https://app.example/cb"));
        assert!(!client.redirect_uri_allowed("https://app.example/cb/"));
        assert!(!client.redirect_uri_allowed("https://app.example"));
    }
}

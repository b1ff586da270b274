use serde::Serialize;

use super::UCP_SCOPE;

/// RFC 8414 authorization-server metadata document.
#[derive(Debug, Clone, Serialize)]
pub struct ServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revocation_endpoint: String,
    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}

/// Pure derivation of the discovery document from the issuer URL. No state,
/// no failure modes.
pub fn server_metadata(issuer: &str) -> ServerMetadata {
    let issuer = issuer.trim_end_matches('/');
    ServerMetadata {
        issuer: issuer.to_string(),
        authorization_endpoint: format!("{issuer}/oauth2/authorize"),
        token_endpoint: format!("{issuer}/oauth2/token"),
        revocation_endpoint: format!("{issuer}/oauth2/revoke"),
        scopes_supported: vec![UCP_SCOPE.to_string()],
        response_types_supported: vec!["code".to_string()],
        grant_types_supported: vec!["authorization_code".to_string(), "refresh_token".to_string()],
        token_endpoint_auth_methods_supported: vec!["client_secret_basic".to_string()],
        code_challenge_methods_supported: vec!["S256".to_string(), "plain".to_string()],
    }
}

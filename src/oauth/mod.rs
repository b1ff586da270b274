//! Embedded OAuth 2.0 authorization server core: client registry,
//! authorization-code store, token store, PKCE verification, and RFC 8414
//! metadata. In-memory, process-lifetime state; the HTTP layer in
//! `crate::web` is thin glue over the operations here.

pub mod clients;
pub mod codes;
pub mod error;
pub mod metadata;
pub mod pkce;
pub mod tokens;

use time::Duration;

pub use clients::{ClientRegistry, CreatedClient, OAuthClient};
pub use codes::{AuthorizationCode, CodeState, CodeStore, NewAuthorizationCode};
pub use error::OAuthError;
pub use metadata::{server_metadata, ServerMetadata};
pub use pkce::{ChallengeMethod, CodeChallenge};
pub use tokens::{OAuthToken, TokenKind, TokenState, TokenStore};

/// The single scope this server grants: checkout-session management.
pub const UCP_SCOPE: &str = "ucp:scopes:checkout_session";

pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(1);
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(30);
pub const AUTH_CODE_TTL: Duration = Duration::minutes(10);

/// Successful outcome of the token endpoint. `refresh_token` is present when
/// minted by a code exchange and absent for refresh grants, which reuse the
/// original refresh token.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: String,
}

/// The authorization server: three shared stores behind one handle, passed
/// into request handling via `AppState` rather than living as a global.
#[derive(Debug, Default)]
pub struct OAuthServer {
    pub clients: ClientRegistry,
    codes: CodeStore,
    tokens: TokenStore,
}

impl OAuthServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_client(&self, name: &str, redirect_uris: Vec<String>) -> CreatedClient {
        self.clients.create_client(name, redirect_uris)
    }

    pub fn get_client(&self, client_id: &str) -> Option<OAuthClient> {
        self.clients.get_client(client_id)
    }

    pub fn authenticate_client(&self, client_id: &str, client_secret: &str) -> bool {
        self.clients.authenticate_client(client_id, client_secret)
    }

    /// Issue a code after the caller validated client and redirect URI.
    pub fn create_authorization_code(&self, new: NewAuthorizationCode) -> String {
        self.codes.create(new)
    }

    /// Exchange a code for an access + refresh token pair. The caller has
    /// already authenticated `client_id`.
    pub fn exchange_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenGrant, OAuthError> {
        let consumed = self.codes.consume(code, client_id, redirect_uri, code_verifier)?;

        let access = self
            .tokens
            .issue_access_token(client_id, &consumed.user_id, &consumed.scope, None);
        let refresh = self
            .tokens
            .issue_refresh_token(client_id, &consumed.user_id, &consumed.scope);

        tracing::info!(client_id = %client_id, user_id = %consumed.user_id, "code exchanged");
        Ok(TokenGrant {
            access_token: access.token,
            refresh_token: Some(refresh.token),
            expires_in: ACCESS_TOKEN_TTL.whole_seconds(),
            scope: consumed.scope,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Option<OAuthToken> {
        self.tokens.validate_access_token(token)
    }

    /// Mint a new access token from a refresh token. The refresh token is
    /// left unchanged and remains usable; rotation is a known hardening gap.
    pub fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
    ) -> Result<TokenGrant, OAuthError> {
        let refresh = self.tokens.lookup_refresh_token(refresh_token, client_id)?;
        let access = self.tokens.issue_access_token(
            client_id,
            &refresh.user_id,
            &refresh.scope,
            Some(refresh_token),
        );

        tracing::info!(client_id = %client_id, user_id = %refresh.user_id, "token refreshed");
        Ok(TokenGrant {
            access_token: access.token,
            refresh_token: None,
            expires_in: ACCESS_TOKEN_TTL.whole_seconds(),
            scope: refresh.scope,
        })
    }

    pub fn revoke_token(&self, token: &str) {
        self.tokens.revoke(token);
    }

    pub fn server_metadata(&self, issuer: &str) -> ServerMetadata {
        server_metadata(issuer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn demo_code(server: &OAuthServer, client_id: &str) -> String {
        server.create_authorization_code(NewAuthorizationCode {
            client_id: client_id.to_string(),
            user_id: "user_1".into(),
            scope: UCP_SCOPE.into(),
            redirect_uri: "https://app.example/cb".into(),
            challenge: None,
        })
    }

    #[test]
    fn exchange_mints_both_tokens_with_the_code_scope() {
        let server = OAuthServer::new();
        let created = server.create_client("Demo", vec!["https://app.example/cb".into()]);
        let code = demo_code(&server, &created.client.client_id);

        let grant = server
            .exchange_code(&code, &created.client.client_id, "https://app.example/cb", None)
            .unwrap();
        assert_eq!(grant.expires_in, 3600);
        assert_eq!(grant.scope, UCP_SCOPE);
        let refresh = grant.refresh_token.expect("refresh token");

        let access = server.validate_access_token(&grant.access_token).unwrap();
        assert_eq!(access.user_id, "user_1");
        assert_eq!(access.client_id, created.client.client_id);

        // the sibling refresh token is usable for refresh grants
        let refreshed = server
            .refresh_access_token(&refresh, &created.client.client_id)
            .unwrap();
        assert!(refreshed.refresh_token.is_none());
        assert!(server.validate_access_token(&refreshed.access_token).is_some());
    }

    #[test]
    fn second_exchange_of_the_same_code_fails() {
        let server = OAuthServer::new();
        let created = server.create_client("Demo", vec!["https://app.example/cb".into()]);
        let code = demo_code(&server, &created.client.client_id);

        assert!(server
            .exchange_code(&code, &created.client.client_id, "https://app.example/cb", None)
            .is_ok());
        assert_eq!(
            server
                .exchange_code(&code, &created.client.client_id, "https://app.example/cb", None)
                .unwrap_err(),
            OAuthError::InvalidGrant
        );
    }

    #[test]
    fn refresh_token_is_reusable_until_revoked() {
        let server = OAuthServer::new();
        let created = server.create_client("Demo", vec!["https://app.example/cb".into()]);
        let code = demo_code(&server, &created.client.client_id);
        let grant = server
            .exchange_code(&code, &created.client.client_id, "https://app.example/cb", None)
            .unwrap();
        let refresh = grant.refresh_token.unwrap();

        assert!(server.refresh_access_token(&refresh, &created.client.client_id).is_ok());
        assert!(server.refresh_access_token(&refresh, &created.client.client_id).is_ok());

        server.revoke_token(&refresh);
        assert_eq!(
            server
                .refresh_access_token(&refresh, &created.client.client_id)
                .unwrap_err(),
            OAuthError::InvalidGrant
        );
    }

    #[test]
    fn concurrent_exchanges_of_one_code_yield_exactly_one_grant() {
        let server = Arc::new(OAuthServer::new());
        let created = server.create_client("Demo", vec!["https://app.example/cb".into()]);
        let client_id = created.client.client_id.clone();
        let code = demo_code(&server, &client_id);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let server = Arc::clone(&server);
            let client_id = client_id.clone();
            let code = code.clone();
            handles.push(std::thread::spawn(move || {
                server
                    .exchange_code(&code, &client_id, "https://app.example/cb", None)
                    .is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}

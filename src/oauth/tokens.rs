use std::collections::HashMap;

use parking_lot::RwLock;
use time::OffsetDateTime;

use super::error::OAuthError;
use super::{ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL};
use crate::security::generate_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Active until revoked; revocation is permanent. Expiry is a separate,
/// lazily-observed condition checked against `expires_at` at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Revoked,
}

#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub token: String,
    pub kind: TokenKind,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub expires_at: OffsetDateTime,
    pub state: TokenState,
    /// For an access token minted by a refresh call, the refresh token that
    /// produced it.
    pub parent_token: Option<String>,
}

impl OAuthToken {
    fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.state == TokenState::Active && self.expires_at >= now
    }
}

/// Access and refresh tokens live in independent namespaces keyed by the
/// token string. Expired entries are never evicted; memory grows with
/// issuance, which is acceptable at embedded-server scale.
#[derive(Debug, Default)]
pub struct TokenStore {
    access: RwLock<HashMap<String, OAuthToken>>,
    refresh: RwLock<HashMap<String, OAuthToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_access_token(
        &self,
        client_id: &str,
        user_id: &str,
        scope: &str,
        parent_token: Option<&str>,
    ) -> OAuthToken {
        let token = OAuthToken {
            token: generate_token(32),
            kind: TokenKind::Access,
            client_id: client_id.to_string(),
            user_id: user_id.to_string(),
            scope: scope.to_string(),
            expires_at: OffsetDateTime::now_utc() + ACCESS_TOKEN_TTL,
            state: TokenState::Active,
            parent_token: parent_token.map(|t| t.to_string()),
        };
        self.access.write().insert(token.token.clone(), token.clone());
        token
    }

    pub fn issue_refresh_token(&self, client_id: &str, user_id: &str, scope: &str) -> OAuthToken {
        let token = OAuthToken {
            token: generate_token(32),
            kind: TokenKind::Refresh,
            client_id: client_id.to_string(),
            user_id: user_id.to_string(),
            scope: scope.to_string(),
            expires_at: OffsetDateTime::now_utc() + REFRESH_TOKEN_TTL,
            state: TokenState::Active,
            parent_token: None,
        };
        self.refresh.write().insert(token.token.clone(), token.clone());
        token
    }

    /// The contract consumed by resource-serving middleware: the record iff
    /// the token is known, not revoked, and not expired.
    pub fn validate_access_token(&self, token: &str) -> Option<OAuthToken> {
        self.validate_access_token_at(OffsetDateTime::now_utc(), token)
    }

    fn validate_access_token_at(&self, now: OffsetDateTime, token: &str) -> Option<OAuthToken> {
        self.access
            .read()
            .get(token)
            .filter(|t| t.is_active_at(now))
            .cloned()
    }

    /// Look up a refresh token usable by `client_id` right now. Failures are
    /// indistinguishable to the caller.
    pub fn lookup_refresh_token(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<OAuthToken, OAuthError> {
        self.lookup_refresh_token_at(OffsetDateTime::now_utc(), token, client_id)
    }

    fn lookup_refresh_token_at(
        &self,
        now: OffsetDateTime,
        token: &str,
        client_id: &str,
    ) -> Result<OAuthToken, OAuthError> {
        let refresh = self.refresh.read();
        let Some(record) = refresh.get(token) else {
            return Err(OAuthError::InvalidGrant);
        };
        if record.state == TokenState::Revoked {
            return Err(OAuthError::InvalidGrant);
        }
        if record.client_id != client_id {
            return Err(OAuthError::InvalidGrant);
        }
        if record.expires_at < now {
            return Err(OAuthError::InvalidGrant);
        }
        Ok(record.clone())
    }

    /// Mark the token revoked in whichever namespace it appears. Idempotent;
    /// unknown tokens are accepted as already revoked (RFC 7009).
    pub fn revoke(&self, token: &str) {
        if let Some(record) = self.access.write().get_mut(token) {
            record.state = TokenState::Revoked;
        }
        if let Some(record) = self.refresh.write().get_mut(token) {
            record.state = TokenState::Revoked;
        }
        let prefix: String = token.chars().take(8).collect();
        tracing::info!(token_prefix = %prefix, "token revoked");
    }
}

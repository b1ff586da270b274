use std::collections::HashMap;

use parking_lot::RwLock;
use time::OffsetDateTime;

use super::error::OAuthError;
use super::pkce::CodeChallenge;
use super::AUTH_CODE_TTL;
use crate::security::generate_token;

/// Lifecycle of an authorization code: issued on consent, consumed at most
/// once by a successful exchange. There is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    Issued,
    Consumed,
}

#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub redirect_uri: String,
    pub expires_at: OffsetDateTime,
    pub state: CodeState,
    pub challenge: Option<CodeChallenge>,
}

/// Parameters for issuing a code. The caller has already verified that the
/// client exists and that `redirect_uri` is in its allow-list.
#[derive(Debug, Clone)]
pub struct NewAuthorizationCode {
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub redirect_uri: String,
    pub challenge: Option<CodeChallenge>,
}

/// In-memory store of authorization codes keyed by the code string.
#[derive(Debug, Default)]
pub struct CodeStore {
    codes: RwLock<HashMap<String, AuthorizationCode>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewAuthorizationCode) -> String {
        let code = generate_token(32);
        let record = AuthorizationCode {
            client_id: new.client_id,
            user_id: new.user_id,
            scope: new.scope,
            redirect_uri: new.redirect_uri,
            expires_at: OffsetDateTime::now_utc() + AUTH_CODE_TTL,
            state: CodeState::Issued,
            challenge: new.challenge,
        };
        tracing::info!(
            client_id = %record.client_id,
            user_id = %record.user_id,
            scope = %record.scope,
            "authorization code created"
        );
        self.codes.write().insert(code.clone(), record);
        code
    }

    /// Validate and consume a code in one atomic step. All checks run under
    /// the write lock, so two concurrent exchanges of the same code see
    /// exactly one success. Every failure is `InvalidGrant`; the code is
    /// flipped to `Consumed` only when every check passes.
    pub fn consume(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthorizationCode, OAuthError> {
        self.consume_at(OffsetDateTime::now_utc(), code, client_id, redirect_uri, code_verifier)
    }

    fn consume_at(
        &self,
        now: OffsetDateTime,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthorizationCode, OAuthError> {
        let mut codes = self.codes.write();
        let Some(record) = codes.get_mut(code) else {
            return Err(OAuthError::InvalidGrant);
        };
        if record.state == CodeState::Consumed {
            return Err(OAuthError::InvalidGrant);
        }
        if record.client_id != client_id {
            return Err(OAuthError::InvalidGrant);
        }
        if record.redirect_uri != redirect_uri {
            return Err(OAuthError::InvalidGrant);
        }
        if record.expires_at < now {
            return Err(OAuthError::InvalidGrant);
        }
        if let Some(challenge) = &record.challenge {
            if !challenge.verify(code_verifier.unwrap_or("")) {
                return Err(OAuthError::InvalidGrant);
            }
        }
        record.state = CodeState::Consumed;
        Ok(record.clone())
    }
}

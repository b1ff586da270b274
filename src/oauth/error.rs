use thiserror::Error;

/// Expected, recoverable outcomes of the OAuth core. Nothing in the core
/// panics across this boundary; callers map each variant to a status code.
///
/// `InvalidGrant` deliberately covers every code/refresh-token failure
/// (unknown, consumed, expired, mismatched, failed PKCE) so an attacker
/// cannot enumerate which check rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OAuthError {
    #[error("invalid_client")]
    InvalidClient,
    #[error("invalid_grant")]
    InvalidGrant,
    #[error("invalid_redirect_uri")]
    InvalidRedirectUri,
    #[error("unsupported_response_type")]
    UnsupportedResponseType,
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,
    #[error("access_denied")]
    AccessDenied,
}

impl OAuthError {
    /// The RFC 6749 error code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidGrant => "invalid_grant",
            OAuthError::InvalidRedirectUri => "invalid_redirect_uri",
            OAuthError::UnsupportedResponseType => "unsupported_response_type",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::AccessDenied => "access_denied",
        }
    }
}

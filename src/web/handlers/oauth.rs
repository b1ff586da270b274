use axum::{
    extract::{Form, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{
    app::AppState,
    oauth::{CodeChallenge, NewAuthorizationCode, OAuthError, TokenGrant, UCP_SCOPE},
};

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    #[serde(default)]
    pub response_type: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeForm {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub token: String,
    pub token_type_hint: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

impl TokenResponse {
    fn from_grant(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            token_type: "Bearer".to_string(),
            expires_in: grant.expires_in,
            refresh_token: grant.refresh_token,
            scope: grant.scope,
        }
    }
}

/// RFC 8414 discovery document.
pub async fn metadata(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.oauth.server_metadata(&state.config.server.public_url))
}

/// Entry point of the authorize flow: validate the request, then show the
/// consent screen. Client and redirect-URI problems must never redirect, so
/// they come back as JSON errors.
pub async fn authorize_get(
    State(state): State<AppState>,
    Query(q): Query<AuthorizeQuery>,
) -> Response {
    if q.response_type != "code" {
        return oauth_error_json(OAuthError::UnsupportedResponseType);
    }

    let Some(client) = state.oauth.get_client(&q.client_id) else {
        return oauth_error_json(OAuthError::InvalidClient);
    };
    if !client.redirect_uri_allowed(&q.redirect_uri) {
        return oauth_error_json(OAuthError::InvalidRedirectUri);
    }

    let scope = q.scope.as_deref().unwrap_or(UCP_SCOPE);
    Html(render_consent_page(
        &state.config.merchant.name,
        &client.name,
        &state.config.merchant.consent_user_id,
        &q,
        scope,
    ))
    .into_response()
}

/// Consent decision. The hidden form fields are client-controlled, so client
/// and redirect URI are re-validated before a code is issued.
pub async fn authorize_post(
    State(state): State<AppState>,
    Form(form): Form<AuthorizeForm>,
) -> Response {
    let Some(client) = state.oauth.get_client(&form.client_id) else {
        return oauth_error_json(OAuthError::InvalidClient);
    };
    if !client.redirect_uri_allowed(&form.redirect_uri) {
        return oauth_error_json(OAuthError::InvalidRedirectUri);
    }

    if form.action != "allow" {
        return redirect_with_params(
            &form.redirect_uri,
            vec![
                ("error".to_string(), OAuthError::AccessDenied.code().to_string()),
                ("state".to_string(), form.state.clone().unwrap_or_default()),
            ],
        );
    }

    let user_id = if form.user_id.is_empty() {
        state.config.merchant.consent_user_id.clone()
    } else {
        form.user_id.clone()
    };
    let scope = if form.scope.is_empty() {
        UCP_SCOPE.to_string()
    } else {
        form.scope.clone()
    };
    let challenge = form
        .code_challenge
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| CodeChallenge::new(c.to_string(), form.code_challenge_method.as_deref()));

    let code = state.oauth.create_authorization_code(NewAuthorizationCode {
        client_id: client.client_id,
        user_id,
        scope,
        redirect_uri: form.redirect_uri.clone(),
        challenge,
    });

    redirect_with_params(
        &form.redirect_uri,
        vec![
            ("code".to_string(), code),
            ("state".to_string(), form.state.unwrap_or_default()),
        ],
    )
}

/// Token endpoint: authorization-code exchange and refresh grants. Client
/// credentials arrive via HTTP Basic (RFC 7617) or form fields.
pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<TokenRequest>,
) -> Response {
    let Some(client_id) = authenticate_client(
        &state,
        &headers,
        req.client_id.as_deref(),
        req.client_secret.as_deref(),
    ) else {
        return token_error_response(StatusCode::UNAUTHORIZED, OAuthError::InvalidClient);
    };

    let result = match req.grant_type.as_str() {
        "authorization_code" => state.oauth.exchange_code(
            req.code.as_deref().unwrap_or_default(),
            &client_id,
            req.redirect_uri.as_deref().unwrap_or_default(),
            req.code_verifier.as_deref(),
        ),
        "refresh_token" => state
            .oauth
            .refresh_access_token(req.refresh_token.as_deref().unwrap_or_default(), &client_id),
        _ => Err(OAuthError::UnsupportedGrantType),
    };

    match result {
        Ok(grant) => Json(TokenResponse::from_grant(grant)).into_response(),
        Err(err) => token_error_response(StatusCode::BAD_REQUEST, err),
    }
}

/// RFC 7009 revocation. Unknown tokens succeed like any other.
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<RevokeRequest>,
) -> Response {
    if authenticate_client(
        &state,
        &headers,
        req.client_id.as_deref(),
        req.client_secret.as_deref(),
    )
    .is_none()
    {
        return token_error_response(StatusCode::UNAUTHORIZED, OAuthError::InvalidClient);
    }

    state.oauth.revoke_token(&req.token);
    (StatusCode::OK, Json(json!({}))).into_response()
}

/// Resolve and check client credentials; `Some(client_id)` on success.
fn authenticate_client(
    state: &AppState,
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Option<String> {
    let (client_id, client_secret) =
        extract_client_credentials(headers, form_client_id, form_client_secret)?;
    state
        .oauth
        .authenticate_client(&client_id, client_secret.as_deref().unwrap_or_default())
        .then_some(client_id)
}

/// HTTP Basic takes precedence over form fields when both are present.
fn extract_client_credentials(
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Option<(String, Option<String>)> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        if let Ok(header_str) = value.to_str() {
            if let Some(b64) = header_str.strip_prefix("Basic ") {
                if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(b64.as_bytes()) {
                    if let Ok(pair) = String::from_utf8(decoded) {
                        let mut parts = pair.splitn(2, ':');
                        let id = parts.next().unwrap_or("").to_string();
                        let secret = parts.next().unwrap_or("").to_string();
                        if !id.is_empty() {
                            return Some((id, Some(secret)));
                        }
                    }
                }
            }
        }
    }

    form_client_id.map(|id| (id.to_string(), form_client_secret.map(|s| s.to_string())))
}

fn redirect_with_params(redirect_uri: &str, params: Vec<(String, String)>) -> Response {
    if let Ok(mut url) = Url::parse(redirect_uri) {
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                if !v.is_empty() {
                    pairs.append_pair(&k, &v);
                }
            }
        }
        return Redirect::temporary(url.as_str()).into_response();
    }
    oauth_error_json(OAuthError::InvalidRedirectUri)
}

fn oauth_error_json(error: OAuthError) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error.code() }))).into_response()
}

fn token_error_response(status: StatusCode, error: OAuthError) -> Response {
    (status, Json(json!({ "error": error.code() }))).into_response()
}

fn render_consent_page(
    merchant_name: &str,
    client_name: &str,
    user_id: &str,
    q: &AuthorizeQuery,
    scope: &str,
) -> String {
    let merchant_name = escape_html(merchant_name);
    let client_name = escape_html(client_name);
    let client_id = escape_html(&q.client_id);
    let redirect_uri = escape_html(&q.redirect_uri);
    let scope_value = escape_html(scope);
    let state_value = escape_html(q.state.as_deref().unwrap_or_default());
    let code_challenge = escape_html(q.code_challenge.as_deref().unwrap_or_default());
    let code_challenge_method = escape_html(q.code_challenge_method.as_deref().unwrap_or_default());
    let user_id = escape_html(user_id);

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Authorize - {merchant_name}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 400px; margin: 80px auto; padding: 0 20px; }}
    h2 {{ margin-bottom: 4px; }}
    p {{ color: #666; }}
    .scope {{ background: #f0f0f0; padding: 8px 12px; border-radius: 6px; font-family: monospace; }}
    button {{ padding: 10px 24px; border: none; border-radius: 6px; cursor: pointer; font-size: 14px; margin-right: 8px; }}
    .allow {{ background: #000; color: #fff; }}
    .deny {{ background: #e5e5e5; }}
  </style>
</head>
<body>
  <h2>{merchant_name}</h2>
  <p><strong>{client_name}</strong> wants to access your account.</p>
  <div class="scope">{scope}</div>
  <p>This will allow the app to manage checkout sessions on your behalf.</p>
  <form method="post" action="/oauth2/authorize">
    <input type="hidden" name="client_id" value="{client_id}" />
    <input type="hidden" name="redirect_uri" value="{redirect_uri}" />
    <input type="hidden" name="scope" value="{scope}" />
    <input type="hidden" name="state" value="{state}" />
    <input type="hidden" name="code_challenge" value="{code_challenge}" />
    <input type="hidden" name="code_challenge_method" value="{code_challenge_method}" />
    <input type="hidden" name="user_id" value="{user_id}" />
    <button type="submit" name="action" value="allow" class="allow">Allow</button>
    <button type="submit" name="action" value="deny" class="deny">Deny</button>
  </form>
</body>
</html>"#,
        merchant_name = merchant_name,
        client_name = client_name,
        scope = scope_value,
        client_id = client_id,
        redirect_uri = redirect_uri,
        state = state_value,
        code_challenge = code_challenge,
        code_challenge_method = code_challenge_method,
        user_id = user_id,
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

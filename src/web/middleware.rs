use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;

/// Identity extracted from a validated access token, inserted as a request
/// extension for resource handlers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub client_id: String,
    pub scope: String,
}

/// Gate for bearer-token-protected resource routes. Failure is always 401;
/// the body says whether the header was missing or the token rejected, but
/// never why the token was rejected.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let Some(token) = bearer else {
        return unauthorized("missing_token", "Authorization: Bearer <token> required");
    };

    let Some(record) = state.oauth.validate_access_token(&token) else {
        return unauthorized("invalid_token", "Token is expired, revoked, or invalid");
    };

    request.extensions_mut().insert(AuthContext {
        user_id: record.user_id,
        client_id: record.client_id,
        scope: record.scope,
    });
    next.run(request).await
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

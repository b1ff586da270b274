use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{app::AppState, oauth::OAuthClient};

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub redirect_uris: Vec<String>,
}

/// The only response that ever carries the plaintext secret.
#[derive(Debug, Serialize)]
pub struct CreateClientResponse {
    pub client: OAuthClient,
    pub client_secret: String,
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<CreateClientRequest>,
) -> impl IntoResponse {
    let name = req.name.trim();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Client name is required");
    }
    if req.redirect_uris.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "At least one redirect URI is required");
    }
    for uri in &req.redirect_uris {
        if Url::parse(uri).is_err() {
            return error_response(StatusCode::BAD_REQUEST, "Redirect URIs must be absolute URLs");
        }
    }

    let created = state.oauth.create_client(name, req.redirect_uris);
    (
        StatusCode::CREATED,
        Json(CreateClientResponse {
            client: created.client,
            client_secret: created.client_secret,
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

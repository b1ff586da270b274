use axum::{response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::web::middleware::AuthContext;

/// Minimal bearer-protected resource: the identity the presented access
/// token delegates. Merchant-side UCP routes consume the same `AuthContext`.
pub async fn identity(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "user_id": ctx.user_id,
        "client_id": ctx.client_id,
        "scope": ctx.scope,
    }))
}

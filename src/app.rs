use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::oauth::OAuthServer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub oauth: Arc<OAuthServer>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            oauth: Arc::new(OAuthServer::new()),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    // logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let config = AppConfig::load()?;
    let state = AppState::new(config.clone());

    let app = build_router(state);

    let addr = config.server.bind_addr.clone();
    tracing::info!(%addr, issuer = %config.server.public_url, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    // Resource routes sit behind the bearer-token gate; everything the OAuth
    // dance itself needs stays outside it.
    let protected = Router::new()
        .route("/ucp/v1/identity", get(crate::web::handlers::identity::identity))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::web::middleware::require_bearer,
        ));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/.well-known/oauth-authorization-server",
            get(crate::web::handlers::oauth::metadata),
        )
        .route(
            "/oauth2/authorize",
            get(crate::web::handlers::oauth::authorize_get)
                .post(crate::web::handlers::oauth::authorize_post),
        )
        .route("/oauth2/token", post(crate::web::handlers::oauth::token))
        .route("/oauth2/revoke", post(crate::web::handlers::oauth::revoke))
        .route("/admin/oauth/clients", post(crate::web::handlers::clients::create_client))
        .merge(protected)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

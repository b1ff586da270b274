use axum::Router;
use base64::Engine as _;
use ucp_oauth::app::{build_router, AppState};
use ucp_oauth::config::AppConfig;
use ucp_oauth::oauth::OAuthServer;

/// Build the real router on top of a fresh in-memory OAuth server. The
/// server handle is returned alongside so tests can seed clients directly.
pub fn build_test_app() -> (Router, std::sync::Arc<OAuthServer>) {
    let state = AppState::new(AppConfig::for_tests());
    let oauth = state.oauth.clone();
    (build_router(state), oauth)
}

/// `Authorization: Basic` value for client credentials (RFC 7617).
pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{client_id}:{client_secret}"));
    format!("Basic {encoded}")
}

/// Percent-encoded form body from key/value pairs.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in fields {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

/// Pull a single query parameter out of a redirect Location header.
pub fn query_param(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

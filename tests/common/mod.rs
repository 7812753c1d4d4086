// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use o365_contacts::config::Config;
use o365_contacts::db::ConnectionStore;
use o365_contacts::middleware::create_session_token;
use o365_contacts::models::Connection;
use o365_contacts::routes::create_router;
use o365_contacts::services::ContactsService;
use o365_contacts::AppState;
use std::sync::Arc;

/// Outlook resource id used by seeded connections.
#[allow(dead_code)]
pub const OUTLOOK_RESOURCE: &str = "https://outlook.office365.com/";

/// Config whose OAuth and discovery endpoints point at `base`.
#[allow(dead_code)]
pub fn mock_config(base: &str) -> Config {
    Config::test_default().with_oauth_base(base)
}

/// API endpoint on the mock server, shaped like the real one.
#[allow(dead_code)]
pub fn api_endpoint(base: &str) -> String {
    format!("{}/api/v1.0", base)
}

/// Unsigned JWT carrying `claims` as its payload.
#[allow(dead_code)]
pub fn fake_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

/// A stored connection for `username` talking to `endpoint`.
#[allow(dead_code)]
pub fn connection(username: &str, endpoint: &str, access_token: &str) -> Connection {
    Connection {
        username: username.to_string(),
        user_email: format!("{}@contoso.onmicrosoft.com", username),
        access_token: access_token.to_string(),
        refresh_token: "refresh-1".to_string(),
        outlook_resource_id: OUTLOOK_RESOURCE.to_string(),
        outlook_api_endpoint: endpoint.to_string(),
        connected_at: "2026-01-01T00:00:00+00:00".to_string(),
    }
}

/// Service plus its store, built from `config`.
#[allow(dead_code)]
pub fn test_service(config: &Config) -> (ContactsService, ConnectionStore) {
    let store = ConnectionStore::new();
    let service =
        ContactsService::from_config(config, store.clone()).expect("Failed to build service");
    (service, store)
}

/// Create a test app. Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app(config: Config) -> (axum::Router, Arc<AppState>, ConnectionStore) {
    let (contacts, store) = test_service(&config);
    let state = Arc::new(AppState { config, contacts });
    (create_router(state.clone()), state, store)
}

/// `Authorization` header value for a session of `username`.
#[allow(dead_code)]
pub fn session_header(state: &AppState, username: &str) -> String {
    let token = create_session_token(username, &state.config.session_signing_key)
        .expect("Failed to create session token");
    format!("Bearer {}", token)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Office 365 OAuth connection routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a connect attempt may take before its state expires.
const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Tolerated clock drift for states stamped "in the future".
const STATE_CLOCK_SKEW: Duration = Duration::from_secs(60);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts/connect", get(connect))
        .route("/contacts/authorize", get(authorize))
        .route("/contacts/disconnect", post(disconnect))
}

/// Start OAuth flow - redirect to the Azure AD login/consent page.
async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Redirect> {
    let oauth_state = sign_state(&user.username, &state.config.oauth_state_key, now_millis()?)?;

    let auth_url = state
        .contacts
        .discovery()
        .get_authorization_url_with_state(&state.config.redirect_uri, &oauth_state);

    tracing::info!(
        username = %user.username,
        client_id = %state.config.client_id,
        "Starting OAuth flow, redirecting to Azure AD"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct AuthorizeParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth redirect target - exchange the code and store the connection.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Redirect> {
    if let Some(error) = params.error {
        tracing::warn!(
            username = %user.username,
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "OAuth error from Azure AD"
        );
        return Err(AppError::AuthorizationDenied("Connection canceled.".to_string()));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(AppError::AuthorizationDenied("Connection canceled.".to_string()));
    };

    let oauth_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;

    if !verify_state(
        &oauth_state,
        &state.config.oauth_state_key,
        &user.username,
        now_millis()?,
    ) {
        tracing::warn!(username = %user.username, "Invalid or expired OAuth state");
        return Err(AppError::BadRequest(
            "Invalid or expired state parameter".to_string(),
        ));
    }

    tracing::info!(username = %user.username, "Exchanging authorization code");

    state
        .contacts
        .connect(&user.username, &code, &state.config.redirect_uri)
        .await?;

    Ok(Redirect::to("/contacts"))
}

/// Forget the user's Office 365 connection.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Redirect> {
    state.contacts.disconnect(&user.username).await?;
    Ok(Redirect::to("/contacts"))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Sign `username|timestamp_hex` and base64url the result for the URL.
fn sign_state(username: &str, secret: &[u8], now_ms: u128) -> Result<String> {
    let payload = format!("{}|{:x}", username, now_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Check signature, owner and age of an OAuth state parameter.
fn verify_state(state: &str, secret: &[u8], username: &str, now_ms: u128) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    // Format is "username|timestamp_hex|signature_hex"; the username is
    // taken from the left so it may itself contain '|'.
    let mut parts = state_str.rsplitn(3, '|');
    let (Some(signature_hex), Some(timestamp_hex), Some(state_user)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{}|{}", state_user, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    if state_user != username {
        return false;
    }

    let Ok(issued_ms) = u128::from_str_radix(timestamp_hex, 16) else {
        return false;
    };

    issued_ms <= now_ms + STATE_CLOCK_SKEW.as_millis()
        && now_ms.saturating_sub(issued_ms) <= STATE_TTL.as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret_key";
    const NOW: u128 = 1_767_225_600_000;

    #[test]
    fn test_state_roundtrip() {
        let state = sign_state("alice", SECRET, NOW).unwrap();
        assert!(verify_state(&state, SECRET, "alice", NOW + 1_000));
    }

    #[test]
    fn test_state_is_url_safe() {
        let state = sign_state("alice|with+odd/chars", SECRET, NOW).unwrap();
        assert!(!state.contains('+'));
        assert!(!state.contains('/'));
        assert!(!state.contains('='));
        assert!(verify_state(&state, SECRET, "alice|with+odd/chars", NOW));
    }

    #[test]
    fn test_state_rejects_other_user() {
        let state = sign_state("alice", SECRET, NOW).unwrap();
        assert!(!verify_state(&state, SECRET, "mallory", NOW));
    }

    #[test]
    fn test_state_rejects_wrong_secret() {
        let state = sign_state("alice", SECRET, NOW).unwrap();
        assert!(!verify_state(&state, b"wrong_key", "alice", NOW));
    }

    #[test]
    fn test_state_expires() {
        let state = sign_state("alice", SECRET, NOW).unwrap();
        let later = NOW + STATE_TTL.as_millis() + 1;
        assert!(!verify_state(&state, SECRET, "alice", later));
    }

    #[test]
    fn test_state_rejects_tampered_payload() {
        let state = sign_state("alice", SECRET, NOW).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(decoded.replacen("alice", "mallory", 1));
        assert!(!verify_state(&forged, SECRET, "mallory", NOW));
    }

    #[test]
    fn test_state_malformed() {
        let encoded = URL_SAFE_NO_PAD.encode("invalid|format");
        assert!(!verify_state(&encoded, SECRET, "invalid", NOW));
        assert!(!verify_state("not-valid-base64!!!", SECRET, "alice", NOW));
    }
}

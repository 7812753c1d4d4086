// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local session middleware.
//!
//! The hosting site signs users in and hands out an HS256 session token
//! whose subject is the local username.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "o365_session";

/// Session lifetime.
const SESSION_TTL_SECS: usize = 12 * 60 * 60;

/// Claims of a session issued by the hosting site.
///
/// `sub` is the local username that connections are keyed by; it is not an
/// Office 365 identity.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Signed-in local user extracted from the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Session token from the `o365_session` cookie, else a bearer header.
fn session_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Local username carried by a valid session token.
fn session_user(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            None
        }
    }
}

/// Middleware that requires a valid local session.
///
/// Inserts [`AuthUser`] into the request extensions for the handlers.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let username = session_token(&jar, &request)
        .and_then(|token| session_user(&token, &state.config.session_signing_key))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { username });

    Ok(next.run(request).await)
}

/// Issue a session for a local user. Used by the hosting site's login.
pub fn create_session_token(username: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    anyhow::ensure!(!username.is_empty(), "username must not be empty");

    let now = chrono::Utc::now().timestamp();
    let iat = usize::try_from(now)?;

    let claims = Claims {
        sub: username.to_string(),
        iat,
        exp: iat + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_session_key_32_bytes_long!!";

    #[test]
    fn test_session_user_roundtrip() {
        let token = create_session_token("alice", KEY).unwrap();
        assert_eq!(session_user(&token, KEY).as_deref(), Some("alice"));
        assert_eq!(session_user(&token, b"other_key"), None);
    }

    #[test]
    fn test_empty_username_is_refused() {
        assert!(create_session_token("", KEY).is_err());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let claims = Claims {
            sub: "alice".to_string(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();
        assert_eq!(session_user(&token, KEY), None);
    }
}

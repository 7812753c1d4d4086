// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything the HTTP clients need (endpoints, credentials, TLS policy,
//! timeouts) lives here and is handed to them at construction.

use anyhow::Context;
use std::env;
use std::time::Duration;

/// Azure AD v1 authorize endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://login.windows.net/common/oauth2/authorize";
/// Azure AD v1 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://login.windows.net/common/oauth2/token";
/// Resource id the discovery token is requested for.
pub const DEFAULT_DISCOVERY_RESOURCE: &str = "https://api.office.com/discovery/";
/// Discovery service endpoint listing the user's services.
pub const DEFAULT_DISCOVERY_ENDPOINT: &str = "https://api.office.com/discovery/v1.0/me/services";

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8000/contacts/authorize";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Registered Azure AD application (client) id
    pub client_id: String,
    /// Redirect URI registered for the application
    pub redirect_uri: String,
    /// Server port
    pub port: u16,
    pub authorize_url: String,
    pub token_url: String,
    pub discovery_resource: String,
    pub discovery_endpoint: String,
    /// Verify TLS certificates on outbound calls
    pub verify_tls: bool,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,

    // --- Secrets ---
    /// Azure AD application secret
    pub client_secret: String,
    /// HS256 key for local session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .into_bytes();
        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| session_signing_key.clone());

        Ok(Self {
            client_id: env::var("O365_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("O365_CLIENT_ID"))?,
            redirect_uri: env_or("REDIRECT_URI", DEFAULT_REDIRECT_URI),
            port: parse_env("PORT", DEFAULT_PORT)?,
            authorize_url: env_or("AUTHORIZE_URL", DEFAULT_AUTHORIZE_URL),
            token_url: env_or("TOKEN_URL", DEFAULT_TOKEN_URL),
            discovery_resource: env_or("DISCOVERY_RESOURCE", DEFAULT_DISCOVERY_RESOURCE),
            discovery_endpoint: env_or("DISCOVERY_ENDPOINT", DEFAULT_DISCOVERY_ENDPOINT),
            verify_tls: parse_env("VERIFY_TLS", true)?,
            http_timeout: Duration::from_secs(parse_env(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            client_secret: env::var("O365_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("O365_CLIENT_SECRET"))?,
            session_signing_key,
            oauth_state_key,
        })
    }

    /// Config for tests only. Vendor endpoints point at production hosts;
    /// tests that talk HTTP override them with a mock server URI.
    pub fn test_default() -> Self {
        Self {
            client_id: "test-client-id".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            port: DEFAULT_PORT,
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            discovery_resource: DEFAULT_DISCOVERY_RESOURCE.to_string(),
            discovery_endpoint: DEFAULT_DISCOVERY_ENDPOINT.to_string(),
            verify_tls: true,
            http_timeout: Duration::from_secs(5),
            client_secret: "test-client-secret".to_string(),
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
        }
    }

    /// Build the outbound HTTP client used by every vendor call.
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
            .context("failed building Office 365 HTTP client")
    }

    /// Point the token and discovery endpoints at `base` (a mock server).
    pub fn with_oauth_base(mut self, base: &str) -> Self {
        self.authorize_url = format!("{base}/common/oauth2/authorize");
        self.token_url = format!("{base}/common/oauth2/token");
        self.discovery_endpoint = format!("{base}/discovery/v1.0/me/services");
        self
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

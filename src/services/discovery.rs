// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Azure AD OAuth2 and Office 365 discovery client.
//!
//! Handles:
//! - Building the authorize URL users are redirected to
//! - Exchanging an authorization code for a discovery-service token
//! - Looking up resource IDs and API endpoints per capability
//! - Getting access tokens for a specific resource from a refresh token

use crate::config::Config;
use crate::error::AppError;
use crate::services::token;
use reqwest::{header::ACCEPT, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// Resource ID and API endpoint for one discovered capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredService {
    pub resource_id: String,
    pub api_endpoint: String,
}

/// Everything learned from one authorization.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// Keyed by capability name ("Contacts", "Mail", "Calendar", ...)
    pub services: HashMap<String, DiscoveredService>,
    /// Refresh token usable for any discovered resource
    pub refresh_token: String,
    /// Office 365 account email (from the token's `upn`)
    pub user_email: String,
}

impl DiscoveryResult {
    pub fn service(&self, capability: &str) -> Option<&DiscoveredService> {
        self.services.get(capability)
    }
}

/// Access token for one resource.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    /// Present when the token endpoint rotated the refresh token
    pub refresh_token: Option<String>,
}

/// Raw token endpoint response (success and error share one shape).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    value: Vec<DiscoveryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryEntry {
    capability: String,
    service_resource_id: String,
    service_endpoint_uri: String,
}

/// OAuth2 + discovery client bound to one registered application.
#[derive(Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorize_url: String,
    token_url: String,
    discovery_resource: String,
    discovery_endpoint: String,
}

impl DiscoveryClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self::with_http(config, config.http_client()?))
    }

    /// Build a client that shares an existing HTTP connection pool.
    pub fn with_http(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            discovery_resource: config.discovery_resource.clone(),
            discovery_endpoint: config.discovery_endpoint.clone(),
        }
    }

    /// URL that starts the authorization-code flow for `redirect_uri`.
    pub fn get_authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code",
            self.authorize_url,
            self.client_id,
            urlencoding::encode(redirect_uri)
        )
    }

    /// Authorization URL carrying an opaque `state` value.
    pub fn get_authorization_url_with_state(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}&state={}",
            self.get_authorization_url(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a discovery token, then discover
    /// the user's services.
    pub async fn exchange_code_for_discovery(
        &self,
        auth_code: &str,
        redirect_uri: &str,
    ) -> Result<DiscoveryResult, AppError> {
        tracing::debug!("Requesting discovery token from authorization code");

        let grant = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", auth_code),
                ("redirect_uri", redirect_uri),
                ("resource", self.discovery_resource.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .await?;

        let services = self.do_discovery(&grant.access_token).await?;

        let refresh_token = grant.refresh_token.ok_or_else(|| {
            AppError::TokenExchangeFailed("Token response has no refresh_token".to_string())
        })?;

        let user_email = token::principal_name(&grant.access_token)?;

        tracing::info!(
            user_email = %user_email,
            services = services.len(),
            "Discovery completed"
        );

        Ok(DiscoveryResult {
            services,
            refresh_token,
            user_email,
        })
    }

    /// Query the discovery service for the user's capabilities.
    ///
    /// If a capability shows up twice the last entry wins.
    pub async fn do_discovery(
        &self,
        token: &str,
    ) -> Result<HashMap<String, DiscoveredService>, AppError> {
        let response = self
            .http
            .get(&self.discovery_endpoint)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.json::<serde_json::Value>().await.ok();
            return Err(AppError::from_status(status, body.as_ref()));
        }

        let body: DiscoveryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Decoding(format!("Invalid discovery response: {}", e)))?;

        let mut services = HashMap::new();
        for entry in body.value {
            tracing::debug!(
                capability = %entry.capability,
                resource_id = %entry.service_resource_id,
                api_endpoint = %entry.service_endpoint_uri,
                "Capability found"
            );
            services.insert(
                entry.capability,
                DiscoveredService {
                    resource_id: entry.service_resource_id,
                    api_endpoint: entry.service_endpoint_uri,
                },
            );
        }

        Ok(services)
    }

    /// Get an access token for `resource_id` using a refresh token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        resource_id: &str,
    ) -> Result<TokenGrant, AppError> {
        tracing::debug!(resource_id, "Refreshing access token");

        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("resource", resource_id),
        ])
        .await
    }

    /// POST a grant to the token endpoint.
    ///
    /// Azure AD reports failures as a JSON body with `error` and
    /// `error_description`; anything without an access token is a failed
    /// exchange regardless of status.
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::TokenExchangeFailed(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::TokenExchangeFailed(format!(
                "Unreadable token response (HTTP {}): {}",
                status, e
            ))
        })?;

        match body.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(TokenGrant {
                access_token,
                refresh_token: body.refresh_token,
            }),
            _ => {
                let reason = body
                    .error_description
                    .or(body.error)
                    .unwrap_or_else(|| format!("No access_token in response (HTTP {})", status));
                tracing::warn!(status = %status, "Token endpoint returned no access token");
                Err(AppError::TokenExchangeFailed(reason))
            }
        }
    }
}

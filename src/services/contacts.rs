// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! High-level contacts service with token management.
//!
//! Access tokens are not tracked for expiry. A connection starts with an
//! empty access token, one is fetched with the refresh token on first use,
//! and a 401 from Office 365 triggers exactly one refresh-and-retry.

use crate::config::Config;
use crate::db::ConnectionStore;
use crate::error::AppError;
use crate::models::{Connection, DisplayContact};
use crate::services::discovery::DiscoveryClient;
use crate::services::outlook::OutlookClient;
use reqwest::StatusCode;
use std::future::Future;

/// Discovery capability whose endpoint serves contacts.
pub const CONTACTS_CAPABILITY: &str = "Contacts";

/// OData query used for the contact list view.
const LIST_QUERY: &[(&str, &str)] = &[
    ("$top", "50"),
    ("$select", "GivenName,Surname,MobilePhone1,EmailAddresses"),
    ("$orderby", "GivenName ASC"),
];

/// Contacts service bound to the connection store.
#[derive(Clone)]
pub struct ContactsService {
    discovery: DiscoveryClient,
    outlook: OutlookClient,
    store: ConnectionStore,
}

impl ContactsService {
    pub fn new(discovery: DiscoveryClient, outlook: OutlookClient, store: ConnectionStore) -> Self {
        Self {
            discovery,
            outlook,
            store,
        }
    }

    /// Build both vendor clients from config, sharing one connection pool.
    pub fn from_config(config: &Config, store: ConnectionStore) -> Result<Self, AppError> {
        let http = config.http_client()?;
        Ok(Self::new(
            DiscoveryClient::with_http(config, http.clone()),
            OutlookClient::with_http(http),
            store,
        ))
    }

    pub fn discovery(&self) -> &DiscoveryClient {
        &self.discovery
    }

    // ─── Connection Lifecycle ────────────────────────────────────────────────

    /// Handle the OAuth redirect: exchange the code, discover the Contacts
    /// endpoint and store the connection.
    pub async fn connect(
        &self,
        username: &str,
        auth_code: &str,
        redirect_uri: &str,
    ) -> Result<Connection, AppError> {
        let discovered = self
            .discovery
            .exchange_code_for_discovery(auth_code, redirect_uri)
            .await?;

        let contacts = discovered.service(CONTACTS_CAPABILITY).ok_or_else(|| {
            AppError::TokenExchangeFailed(format!(
                "Account exposes no {} service",
                CONTACTS_CAPABILITY
            ))
        })?;

        let connection = Connection {
            username: username.to_string(),
            user_email: discovered.user_email.clone(),
            access_token: String::new(),
            refresh_token: discovered.refresh_token.clone(),
            outlook_resource_id: contacts.resource_id.clone(),
            outlook_api_endpoint: contacts.api_endpoint.clone(),
            connected_at: chrono::Utc::now().to_rfc3339(),
        };

        self.store.upsert_connection(&connection).await?;

        tracing::info!(
            username,
            user_email = %connection.user_email,
            "Office 365 account connected"
        );

        Ok(connection)
    }

    /// The stored connection, if the user has connected an account.
    pub async fn find_connection(&self, username: &str) -> Result<Option<Connection>, AppError> {
        self.store.get_connection(username).await
    }

    pub async fn connection(&self, username: &str) -> Result<Connection, AppError> {
        self.find_connection(username)
            .await?
            .ok_or(AppError::NotConnected)
    }

    /// Drop the stored connection. Returns whether one existed.
    pub async fn disconnect(&self, username: &str) -> Result<bool, AppError> {
        let removed = self.store.delete_connection(username).await?;
        if removed {
            tracing::info!(username, "Office 365 account disconnected");
        }
        Ok(removed)
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a new access token for the connection's resource and persist it.
    pub async fn refresh(&self, connection: &Connection) -> Result<String, AppError> {
        let grant = self
            .discovery
            .refresh_access_token(&connection.refresh_token, &connection.outlook_resource_id)
            .await?;

        self.store
            .set_tokens(
                &connection.username,
                &grant.access_token,
                grant.refresh_token.as_deref(),
            )
            .await?;

        tracing::info!(username = %connection.username, "Access token refreshed");
        Ok(grant.access_token)
    }

    /// A usable access token, refreshing first when none is stored.
    pub async fn access_token(&self, username: &str) -> Result<String, AppError> {
        let connection = self.connection(username).await?;
        if connection.needs_access_token() {
            return self.refresh(&connection).await;
        }
        Ok(connection.access_token)
    }

    /// Run `op(endpoint, token)`, refreshing and retrying once on 401.
    ///
    /// A connection with no stored access token is refreshed before the
    /// first call; that does not use up the retry.
    async fn with_token_retry<T, F, Fut>(&self, username: &str, op: F) -> Result<T, AppError>
    where
        F: Fn(String, String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let connection = self.connection(username).await?;
        let endpoint = connection.outlook_api_endpoint.clone();

        let token = if connection.needs_access_token() {
            self.refresh(&connection).await?
        } else {
            connection.access_token.clone()
        };

        match op(endpoint.clone(), token).await {
            Err(e) if e.is_unauthorized() => {
                tracing::info!(username, "Access token rejected, refreshing and retrying once");

                // The lazy refresh above may have rotated the refresh token.
                let connection = self
                    .find_connection(username)
                    .await?
                    .unwrap_or(connection);

                let token = match self.refresh(&connection).await {
                    Ok(token) => token,
                    Err(refresh_err) => {
                        // Leave the connection needing a refresh on next use.
                        if let Err(clear_err) = self.store.set_tokens(username, "", None).await {
                            tracing::warn!(
                                username,
                                error = %clear_err,
                                "Could not clear rejected access token"
                            );
                        }
                        return Err(refresh_err);
                    }
                };

                op(endpoint, token).await
            }
            result => result,
        }
    }

    // ─── Contacts ────────────────────────────────────────────────────────────

    /// First page of the user's contacts, ordered by given name.
    pub async fn list_contacts(&self, username: &str) -> Result<Vec<DisplayContact>, AppError> {
        let outlook = &self.outlook;
        let body = self
            .with_token_retry(username, |endpoint, token| async move {
                outlook.list_contacts(&endpoint, &token, LIST_QUERY).await
            })
            .await?;

        DisplayContact::list_from_outlook(&body)
    }

    pub async fn get_contact(
        &self,
        username: &str,
        contact_id: &str,
    ) -> Result<DisplayContact, AppError> {
        let outlook = &self.outlook;
        let body = self
            .with_token_retry(username, |endpoint, token| async move {
                outlook.get_contact(&endpoint, &token, contact_id, &[]).await
            })
            .await?;

        DisplayContact::from_outlook(&body)
    }

    /// Create a contact. Empty email slots are left out of the payload.
    pub async fn create_contact(
        &self,
        username: &str,
        contact: &DisplayContact,
    ) -> Result<(), AppError> {
        let outlook = &self.outlook;
        let payload = contact.to_payload(false);
        let payload = &payload;

        let status = self
            .with_token_retry(username, |endpoint, token| async move {
                outlook.create_contact(&endpoint, &token, payload).await
            })
            .await?;

        expect_status(status, StatusCode::CREATED)
    }

    /// Update a contact. Empty email slots are sent as `null` to clear them.
    pub async fn update_contact(
        &self,
        username: &str,
        contact_id: &str,
        contact: &DisplayContact,
    ) -> Result<(), AppError> {
        let outlook = &self.outlook;
        let payload = contact.to_payload(true);
        let payload = &payload;

        let status = self
            .with_token_retry(username, |endpoint, token| async move {
                outlook
                    .update_contact(&endpoint, &token, contact_id, payload)
                    .await
            })
            .await?;

        expect_status(status, StatusCode::OK)
    }

    pub async fn delete_contact(&self, username: &str, contact_id: &str) -> Result<(), AppError> {
        let outlook = &self.outlook;

        let status = self
            .with_token_retry(username, |endpoint, token| async move {
                outlook.delete_contact(&endpoint, &token, contact_id).await
            })
            .await?;

        expect_status(status, StatusCode::NO_CONTENT)
    }
}

fn expect_status(status: StatusCode, expected: StatusCode) -> Result<(), AppError> {
    if status == expected {
        Ok(())
    } else {
        Err(AppError::from_status(status, None))
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process connection store keyed by local username.

use crate::error::AppError;
use crate::models::Connection;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared store of Office 365 connections.
///
/// Cloning is cheap; all clones see the same connections.
#[derive(Clone, Default)]
pub struct ConnectionStore {
    connections: Arc<DashMap<String, Connection>>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the connection for a local user.
    pub async fn get_connection(&self, username: &str) -> Result<Option<Connection>, AppError> {
        Ok(self.connections.get(username).map(|c| c.value().clone()))
    }

    /// Create or replace a user's connection.
    pub async fn upsert_connection(&self, connection: &Connection) -> Result<(), AppError> {
        self.connections
            .insert(connection.username.clone(), connection.clone());
        Ok(())
    }

    /// Store a new access token (and optionally a rotated refresh token).
    pub async fn set_tokens(
        &self,
        username: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AppError> {
        let mut entry = self
            .connections
            .get_mut(username)
            .ok_or(AppError::NotConnected)?;

        entry.access_token = access_token.to_string();
        if let Some(refresh_token) = refresh_token {
            entry.refresh_token = refresh_token.to_string();
        }
        Ok(())
    }

    /// Remove a user's connection. Returns whether one existed.
    pub async fn delete_connection(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.connections.remove(username).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(username: &str) -> Connection {
        Connection {
            username: username.to_string(),
            user_email: format!("{}@contoso.com", username),
            access_token: String::new(),
            refresh_token: "refresh-1".to_string(),
            outlook_resource_id: "https://outlook.office365.com/".to_string(),
            outlook_api_endpoint: "https://outlook.office365.com/api/v1.0".to_string(),
            connected_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_tokens_keeps_refresh_token_when_not_rotated() {
        let store = ConnectionStore::new();
        store.upsert_connection(&connection("alice")).await.unwrap();

        store.set_tokens("alice", "access-1", None).await.unwrap();
        let stored = store.get_connection("alice").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "access-1");
        assert_eq!(stored.refresh_token, "refresh-1");

        store
            .set_tokens("alice", "access-2", Some("refresh-2"))
            .await
            .unwrap();
        let stored = store.get_connection("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, "refresh-2");
    }

    #[tokio::test]
    async fn test_set_tokens_without_connection() {
        let store = ConnectionStore::new();
        let result = store.set_tokens("nobody", "access", None).await;
        assert!(matches!(result, Err(AppError::NotConnected)));
    }

    #[tokio::test]
    async fn test_delete_connection() {
        let store = ConnectionStore::new();
        store.upsert_connection(&connection("bob")).await.unwrap();

        assert!(store.delete_connection("bob").await.unwrap());
        assert!(!store.delete_connection("bob").await.unwrap());
        assert!(store.get_connection("bob").await.unwrap().is_none());
    }
}

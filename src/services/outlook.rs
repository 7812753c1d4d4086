// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Office 365 (Outlook) REST API client for contacts, mail and calendar.
//!
//! Every request goes through [`OutlookClient::call`]. A 401 always comes
//! back as [`AppError::Unauthorized`] so callers can refresh and retry.
//! Write operations hand back the raw status; callers compare it with the
//! code the vendor documents for success (201 create, 200 update, 204
//! delete, 202 send).

use crate::config::Config;
use crate::error::AppError;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

/// Item collections under `/Me`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Contacts,
    Messages,
    Events,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Contacts => "Contacts",
            Collection::Messages => "Messages",
            Collection::Events => "Events",
        }
    }
}

/// Status and (JSON) body of a non-401 response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed body, `None` when empty or not JSON
    pub body: Option<Value>,
}

/// `{endpoint}/Me/{Collection}[/{id}]`
pub fn resource_url(endpoint: &str, collection: Collection, id: Option<&str>) -> String {
    let mut url = format!(
        "{}/Me/{}",
        endpoint.trim_end_matches('/'),
        collection.as_str()
    );
    if let Some(id) = id {
        url.push('/');
        url.push_str(&urlencoding::encode(id));
    }
    url
}

/// Append OData query parameters (`$top`, `$select`, ...) to a URL.
fn with_query(url: String, query: &[(&str, &str)]) -> Result<String, AppError> {
    if query.is_empty() {
        return Ok(url);
    }

    reqwest::Url::parse_with_params(&url, query)
        .map(|u| u.to_string())
        .map_err(|e| AppError::BadRequest(format!("Invalid API URL {}: {}", url, e)))
}

/// Outlook REST API client.
#[derive(Clone)]
pub struct OutlookClient {
    http: reqwest::Client,
}

impl OutlookClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self::with_http(config.http_client()?))
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Make one authenticated API call.
    ///
    /// Each call carries a fresh `client-request-id` so failures can be
    /// matched against vendor-side logs.
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        token: &str,
        payload: Option<&Value>,
    ) -> Result<ApiResponse, AppError> {
        let correlation_id = Uuid::new_v4().to_string();

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header("client-request-id", correlation_id.as_str())
            .header("return-client-request-id", "true");

        if method == Method::POST || method == Method::PATCH {
            let body = match payload {
                Some(payload) => serde_json::to_vec(payload)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("Payload encoding: {}", e)))?,
                None => Vec::new(),
            };
            request = request
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_LENGTH, body.len())
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(
            method = %method,
            url,
            status = status.as_u16(),
            correlation_id = %correlation_id,
            "Office 365 API call"
        );

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(correlation_id = %correlation_id, "Office 365 returned 401");
            return Err(AppError::Unauthorized);
        }

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        Ok(ApiResponse { status, body })
    }

    // ─── Generic Collection Operations ───────────────────────────

    /// List items in a collection, optionally filtered/sorted via OData.
    pub async fn list(
        &self,
        endpoint: &str,
        token: &str,
        collection: Collection,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        let url = with_query(resource_url(endpoint, collection, None), query)?;
        let response = self.call(Method::GET, &url, token, None).await?;
        expect_json(response)
    }

    /// Get one item by ID.
    pub async fn get(
        &self,
        endpoint: &str,
        token: &str,
        collection: Collection,
        id: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        let url = with_query(resource_url(endpoint, collection, Some(id)), query)?;
        let response = self.call(Method::GET, &url, token, None).await?;
        expect_json(response)
    }

    /// Create an item. Success is 201.
    pub async fn create(
        &self,
        endpoint: &str,
        token: &str,
        collection: Collection,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        let url = resource_url(endpoint, collection, None);
        let response = self.call(Method::POST, &url, token, Some(payload)).await?;
        Ok(response.status)
    }

    /// Patch an item. Success is 200.
    pub async fn update(
        &self,
        endpoint: &str,
        token: &str,
        collection: Collection,
        id: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        let url = resource_url(endpoint, collection, Some(id));
        let response = self.call(Method::PATCH, &url, token, Some(payload)).await?;
        Ok(response.status)
    }

    /// Delete an item. Success is 204.
    pub async fn delete(
        &self,
        endpoint: &str,
        token: &str,
        collection: Collection,
        id: &str,
    ) -> Result<StatusCode, AppError> {
        let url = resource_url(endpoint, collection, Some(id));
        let response = self.call(Method::DELETE, &url, token, None).await?;
        Ok(response.status)
    }

    // ─── Contacts ────────────────────────────────────────────────

    pub async fn list_contacts(
        &self,
        endpoint: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.list(endpoint, token, Collection::Contacts, query).await
    }

    pub async fn get_contact(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.get(endpoint, token, Collection::Contacts, id, query)
            .await
    }

    pub async fn create_contact(
        &self,
        endpoint: &str,
        token: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.create(endpoint, token, Collection::Contacts, payload)
            .await
    }

    pub async fn update_contact(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.update(endpoint, token, Collection::Contacts, id, payload)
            .await
    }

    pub async fn delete_contact(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
    ) -> Result<StatusCode, AppError> {
        self.delete(endpoint, token, Collection::Contacts, id).await
    }

    // ─── Mail ────────────────────────────────────────────────────

    pub async fn list_messages(
        &self,
        endpoint: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.list(endpoint, token, Collection::Messages, query).await
    }

    pub async fn get_message(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.get(endpoint, token, Collection::Messages, id, query)
            .await
    }

    /// Create a draft message. Success is 201.
    pub async fn create_message(
        &self,
        endpoint: &str,
        token: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.create(endpoint, token, Collection::Messages, payload)
            .await
    }

    pub async fn update_message(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.update(endpoint, token, Collection::Messages, id, payload)
            .await
    }

    pub async fn delete_message(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
    ) -> Result<StatusCode, AppError> {
        self.delete(endpoint, token, Collection::Messages, id).await
    }

    /// Send an existing draft.
    pub async fn send_draft_message(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
    ) -> Result<StatusCode, AppError> {
        let url = format!(
            "{}/Send",
            resource_url(endpoint, Collection::Messages, Some(id))
        );
        let response = self.call(Method::POST, &url, token, None).await?;
        Ok(response.status)
    }

    /// Send a new message without creating a draft first. Success is 202.
    pub async fn send_new_message(
        &self,
        endpoint: &str,
        token: &str,
        message: &Value,
        save_to_sent: bool,
    ) -> Result<StatusCode, AppError> {
        let url = format!("{}/Me/SendMail", endpoint.trim_end_matches('/'));
        let envelope = json!({
            "Message": message,
            "SaveToSentItems": save_to_sent,
        });
        let response = self.call(Method::POST, &url, token, Some(&envelope)).await?;
        Ok(response.status)
    }

    // ─── Calendar ────────────────────────────────────────────────

    pub async fn list_events(
        &self,
        endpoint: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.list(endpoint, token, Collection::Events, query).await
    }

    pub async fn get_event(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, AppError> {
        self.get(endpoint, token, Collection::Events, id, query).await
    }

    pub async fn create_event(
        &self,
        endpoint: &str,
        token: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.create(endpoint, token, Collection::Events, payload)
            .await
    }

    pub async fn update_event(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
        payload: &Value,
    ) -> Result<StatusCode, AppError> {
        self.update(endpoint, token, Collection::Events, id, payload)
            .await
    }

    pub async fn delete_event(
        &self,
        endpoint: &str,
        token: &str,
        id: &str,
    ) -> Result<StatusCode, AppError> {
        self.delete(endpoint, token, Collection::Events, id).await
    }
}

/// A read succeeded only on 200 with a JSON body.
fn expect_json(response: ApiResponse) -> Result<Value, AppError> {
    if response.status != StatusCode::OK {
        return Err(AppError::from_status(response.status, response.body.as_ref()));
    }

    response
        .body
        .ok_or_else(|| AppError::Decoding("Expected a JSON response body".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_escapes_id() {
        let url = resource_url(
            "https://outlook.office365.com/api/v1.0/",
            Collection::Contacts,
            Some("AAMk/ADE=="),
        );
        assert_eq!(
            url,
            "https://outlook.office365.com/api/v1.0/Me/Contacts/AAMk%2FADE%3D%3D"
        );
    }

    #[test]
    fn test_with_query_keeps_plain_url_when_empty() {
        let url = with_query("https://x/Me/Events".to_string(), &[]).unwrap();
        assert_eq!(url, "https://x/Me/Events");
    }

    #[test]
    fn test_expect_json_maps_not_found() {
        let response = ApiResponse {
            status: StatusCode::NOT_FOUND,
            body: Some(json!({"error": {"code": "ErrorItemNotFound", "message": "gone"}})),
        };
        match expect_json(response) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "gone"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}

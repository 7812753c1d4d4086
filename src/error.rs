// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The user declined consent or the authorize redirect carried no code.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The token endpoint did not hand out an access token.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Office 365 answered 401; the access token must be refreshed.
    #[error("Office 365 rejected the access token")]
    Unauthorized,

    #[error("No Office 365 account connected")]
    NotConnected,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Office 365 API returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Map a non-success vendor status (other than 401) to an error.
    pub fn from_status(status: StatusCode, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(vendor_error_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized,
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::Upstream {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// True when the caller should refresh the access token and retry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}

/// Pull `error.message` out of an OData error body.
fn vendor_error_message(body: &serde_json::Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::AuthorizationDenied(msg) => {
                (StatusCode::FORBIDDEN, "authorization_denied", Some(msg.clone()))
            }
            AppError::TokenExchangeFailed(msg) => {
                tracing::warn!(error = %msg, "Token exchange failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "token_exchange_failed",
                    Some("Unable to connect Office 365 account.".to_string()),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "office365_unauthorized", None),
            AppError::NotConnected => (StatusCode::CONFLICT, "not_connected", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Upstream { status, message } => (
                StatusCode::BAD_GATEWAY,
                "office365_error",
                Some(format!("HTTP {}: {}", status, message)),
            ),
            AppError::Decoding(msg) => {
                tracing::warn!(error = %msg, "Decoding error");
                (StatusCode::BAD_GATEWAY, "decoding_error", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Http(msg) => {
                tracing::error!(error = %msg, "Outbound HTTP error");
                (StatusCode::BAD_GATEWAY, "http_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token payload decoding.
//!
//! Azure AD access tokens are JWTs. Only the payload is read, to learn who
//! signed in; the signature is not checked.

use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde_json::{Map, Value};

/// Restore the `=` padding stripped from a base64url segment.
pub fn pad_token_segment(segment: &str) -> Result<String, AppError> {
    let padding = match segment.len() % 4 {
        0 => "",
        2 => "==",
        3 => "=",
        _ => {
            return Err(AppError::Decoding(format!(
                "Token segment has invalid length {}",
                segment.len()
            )))
        }
    };

    Ok(format!("{}{}", segment, padding))
}

/// Decode one unpadded base64url segment into UTF-8 text.
pub fn decode_token_segment(segment: &str) -> Result<String, AppError> {
    let padded = pad_token_segment(segment)?;

    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| AppError::Decoding(format!("Token segment is not base64url: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Decoding(format!("Token segment is not UTF-8: {}", e)))
}

/// Decode the payload (second segment) of a JWT into its claims.
pub fn parse_token(token: &str) -> Result<Map<String, Value>, AppError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AppError::Decoding("Token has no payload segment".to_string()))?;

    let decoded = decode_token_segment(payload)?;

    match serde_json::from_str(&decoded) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AppError::Decoding(
            "Token payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::Decoding(format!(
            "Token payload is not JSON: {}",
            e
        ))),
    }
}

/// The signed-in user's principal name (`upn`, else `unique_name`).
pub fn principal_name(token: &str) -> Result<String, AppError> {
    let claims = parse_token(token)?;

    ["upn", "unique_name"]
        .iter()
        .find_map(|claim| claims.get(*claim).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| AppError::Decoding("Token carries no principal name".to_string()))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (sessions, security headers).

pub mod auth;
pub mod security;

pub use auth::{create_session_token, require_auth, AuthUser};

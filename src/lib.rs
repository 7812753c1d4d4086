// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! O365-Contacts: manage Office 365 contacts from a signed-in web session
//!
//! This crate connects a local user to an Office 365 account through the
//! Azure AD authorization-code flow and exposes the account's contacts
//! (plus mail and calendar items through the API client).

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::ContactsService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub contacts: ContactsService,
}

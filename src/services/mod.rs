// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod contacts;
pub mod discovery;
pub mod outlook;
pub mod token;

pub use contacts::ContactsService;
pub use discovery::{DiscoveredService, DiscoveryClient, DiscoveryResult, TokenGrant};
pub use outlook::{ApiResponse, Collection, OutlookClient};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod contact;

pub use connection::Connection;
pub use contact::{ContactForm, DisplayContact, EmailSlot};

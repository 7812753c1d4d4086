//! Database layer (per-user Office 365 connections).

pub mod connections;

pub use connections::ConnectionStore;

//! Cart Survey Core - Shared domain types.
//!
//! This crate provides the types shared by the Cart Survey components:
//! - `app` - OAuth install flow, survey intake, stats and dashboard
//! - `integration-tests` - PostgreSQL-backed tests for the app
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, shop domains and survey answers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Cart Survey app library.
//!
//! A Shopify-embedded app that installs a post-purchase survey widget on a
//! store's cart page, stores the answers, and shows the merchant aggregated
//! results.
//!
//! The crate is split as a library so the router and repositories can be
//! exercised from the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

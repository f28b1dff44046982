//! Shopify platform integration.
//!
//! - [`hmac`] verifies the signature Shopify attaches to the OAuth callback.
//! - [`ShopifyClient`] talks to the OAuth endpoints and the REST Admin API
//!   (token exchange, shop metadata, script tag registration).
//!
//! Every outbound request is addressed to a [`ShopDomain`], so a shop value
//! that does not match the hosted-store grammar never reaches the network.
//!
//! [`ShopDomain`]: cart_survey_core::ShopDomain

mod client;
pub mod hmac;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{ShopMetadata, ShopifyClient, generate_nonce};
pub use hmac::verify_hmac;

use cart_survey_core::ShopDomainError;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// The shop parameter is not a `<store>.myshopify.com` domain.
    #[error("Invalid shop domain: {0}")]
    InvalidDomain(#[from] ShopDomainError),

    /// Shopify rejected the authorization code.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// `shop.json` returned a non-success status.
    #[error("Failed to fetch shop metadata: {0}")]
    MetadataFetchFailed(String),

    /// `script_tags.json` returned a non-success status.
    #[error("Failed to install widget script: {0}")]
    ScriptInstallFailed(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

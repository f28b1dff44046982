//! Installed shop domain model.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use cart_survey_core::{ShopDomain, ShopId};

/// A merchant store that has completed the OAuth install.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct Shop {
    /// Internal row id.
    pub id: ShopId,
    /// Stable Shopify shop id (the upsert key).
    pub shop_id: String,
    /// `<store>.myshopify.com` domain.
    pub domain: ShopDomain,
    /// Display name reported by Shopify.
    pub name: String,
    /// REST Admin API access token; replaced on every reinstall.
    pub access_token: SecretString,
    /// When the shop first installed the app.
    pub created_at: DateTime<Utc>,
    /// When the token or name was last refreshed.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("id", &self.id)
            .field("shop_id", &self.shop_id)
            .field("domain", &self.domain)
            .field("name", &self.name)
            .field("access_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

//! Completing an app install after Shopify redirects back from OAuth.
//!
//! The flow is: exchange the code for a token, fetch the shop's identity,
//! upsert the shop row, then register the widget script tag. Each step runs
//! once; a failure aborts the remaining steps.

use cart_survey_core::ShopDomain;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use crate::db::{RepositoryError, ShopRepository};
use crate::models::Shop;
use crate::shopify::{ShopifyClient, ShopifyError};

/// Errors that can occur while completing an install.
#[derive(Debug, Error)]
pub enum InstallError {
    /// A Shopify call failed.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// Persisting the shop failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// URL Shopify loads on every storefront page once the script tag exists.
#[must_use]
pub fn widget_script_url(app_url: &str, shop: &ShopDomain) -> String {
    format!("{app_url}/survey/script?shop={shop}")
}

/// Run the post-authorization install steps for `shop`.
///
/// The shop row is written before the script tag is registered. If the
/// registration fails the row stays in place (with its fresh token) and the
/// error is returned; a reinstall repeats every step.
///
/// # Errors
///
/// Returns `InstallError::Shopify` if the token exchange, metadata fetch, or
/// script tag registration fails.
/// Returns `InstallError::Repository` if the shop cannot be persisted.
#[instrument(skip(pool, shopify, code), fields(shop = %shop))]
pub async fn complete_install(
    pool: &PgPool,
    shopify: &ShopifyClient,
    shop: &ShopDomain,
    code: &str,
    app_url: &str,
) -> Result<Shop, InstallError> {
    let access_token = shopify.exchange_code_for_token(shop, code).await?;
    let metadata = shopify.fetch_shop_metadata(shop, &access_token).await?;

    let stored = ShopRepository::new(pool)
        .upsert(shop, &metadata.id, &metadata.name, &access_token)
        .await?;
    tracing::info!(shop_id = %stored.shop_id, name = %stored.name, "Shop saved");

    let widget_url = widget_script_url(app_url, shop);
    if let Err(e) = shopify
        .install_widget_script(shop, &access_token, &widget_url)
        .await
    {
        tracing::warn!(
            error = %e,
            shop_id = %stored.shop_id,
            "Widget script registration failed; shop row was already saved"
        );
        return Err(e.into());
    }

    tracing::info!(%widget_url, "Widget script registered");
    Ok(stored)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{lazy_pool, test_state_with_api_origin};
    use crate::shopify::mock::MockShopify;

    fn shop() -> ShopDomain {
        ShopDomain::parse("my-shop.myshopify.com").unwrap()
    }

    #[tokio::test]
    async fn test_rejected_code_stops_before_database() {
        let origin = MockShopify {
            token: (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_request" }),
            ),
            ..MockShopify::default()
        }
        .spawn()
        .await;
        let state = test_state_with_api_origin(None, &origin);

        let err = complete_install(
            &lazy_pool(),
            state.shopify(),
            &shop(),
            "stale",
            "https://survey.test",
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, InstallError::Shopify(ShopifyError::TokenExchangeFailed(_))),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_metadata_failure_stops_before_database() {
        let origin = MockShopify {
            shop: (StatusCode::NOT_FOUND, json!({ "errors": "Not Found" })),
            ..MockShopify::default()
        }
        .spawn()
        .await;
        let state = test_state_with_api_origin(None, &origin);

        let err = complete_install(
            &lazy_pool(),
            state.shopify(),
            &shop(),
            "abc",
            "https://survey.test",
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, InstallError::Shopify(ShopifyError::MetadataFetchFailed(_))),
            "{err:?}"
        );
    }

    #[test]
    fn test_widget_script_url() {
        let shop = ShopDomain::parse("my-shop.myshopify.com").unwrap();
        assert_eq!(
            widget_script_url("https://survey.test", &shop),
            "https://survey.test/survey/script?shop=my-shop.myshopify.com"
        );
    }
}

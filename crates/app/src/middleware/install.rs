//! Install guard for merchant-facing pages.
//!
//! Shopify opens the app with `?shop=<domain>`. If that shop has no stored
//! access token the merchant is sent straight to the OAuth grant page, so
//! the page handlers only ever see installed shops. Requests without a
//! `shop` parameter pass through untouched.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use cart_survey_core::ShopDomain;

use crate::db::ShopRepository;
use crate::error::AppError;
use crate::routes::redirect_found;
use crate::shopify::generate_nonce;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ShopQuery {
    shop: Option<String>,
}

/// Redirect page requests for uninstalled shops into the OAuth flow.
///
/// A `shop` value that is not a `myshopify.com` domain is sent back to the
/// connect page with `?error=invalid_domain`.
pub async fn require_installed_shop(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let shop = Query::<ShopQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.shop)
        .filter(|s| !s.is_empty());

    let Some(shop) = shop else {
        return next.run(request).await;
    };

    let Ok(domain) = ShopDomain::parse(&shop) else {
        tracing::debug!(%shop, "Rejecting page request with invalid shop domain");
        return redirect_found("/?error=invalid_domain");
    };

    match ShopRepository::new(state.pool())
        .has_access_token(&domain)
        .await
    {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            let nonce = generate_nonce();
            match state.shopify().authorization_url(domain.as_str(), &nonce) {
                Ok(url) => {
                    tracing::info!(shop = %domain, "Shop not installed, starting OAuth");
                    redirect_found(&url)
                }
                Err(e) => AppError::from(e).into_response(),
            }
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

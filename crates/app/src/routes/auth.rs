//! Shopify OAuth install routes.
//!
//! Errors from these handlers are answered as plain text (`OAuth error: ...`)
//! because the merchant sees them directly in the browser mid-redirect.
//!
//! The `state` nonce is generated and forwarded to Shopify but is not
//! compared on the callback; the HMAC check is what authenticates the
//! callback.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use cart_survey_core::ShopDomain;

use super::redirect_found;
use crate::config::ConfigError;
use crate::error::AppError;
use crate::services::complete_install;
use crate::shopify::{ShopifyError, generate_nonce, verify_hmac};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthParams {
    pub shop: Option<String>,
}

/// GET /auth?shop= - Redirect the merchant to Shopify's grant page.
#[instrument(skip(state))]
pub async fn start(State(state): State<AppState>, Query(params): Query<AuthParams>) -> Response {
    let Some(shop) = params.shop.filter(|s| !s.is_empty()) else {
        return AppError::BadRequest("Missing shop parameter".to_string()).into_text_response();
    };

    let nonce = generate_nonce();
    match state.shopify().authorization_url(&shop, &nonce) {
        Ok(url) => {
            tracing::info!(%shop, "Redirecting to Shopify OAuth");
            redirect_found(&url)
        }
        Err(e) => {
            tracing::warn!(%shop, error = %e, "Rejected OAuth start");
            AppError::from(e).into_text_response()
        }
    }
}

/// GET /auth/callback - Finish the install and open the dashboard.
#[instrument(skip_all, fields(shop = ?params.get("shop")))]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    match handle_callback(&state, &params).await {
        Ok(response) => response,
        Err(e) => e.into_text_response(),
    }
}

async fn handle_callback(
    state: &AppState,
    params: &BTreeMap<String, String>,
) -> Result<Response, AppError> {
    if !verify_hmac(params, state.shopify().client_secret().expose_secret()) {
        tracing::warn!("HMAC verification failed");
        return Err(AppError::BadRequest("Invalid hmac".to_string()));
    }

    let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty());
    let (Some(shop), Some(code)) = (non_empty("shop"), non_empty("code")) else {
        return Err(AppError::BadRequest(
            "Missing required parameters".to_string(),
        ));
    };

    let domain = ShopDomain::parse(shop).map_err(ShopifyError::from)?;
    let app_url = state.config().require_app_url()?;
    let dashboard_url = dashboard_url(app_url, &domain)?;

    complete_install(state.pool(), state.shopify(), &domain, code, app_url).await?;

    tracing::info!(shop = %domain, "Install complete");
    Ok(redirect_found(&dashboard_url).into_response())
}

/// `<app_url>/dashboard?shop=<shop>`.
fn dashboard_url(app_url: &str, shop: &ShopDomain) -> Result<String, AppError> {
    let mut url = Url::parse(app_url)
        .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_APP_URL".to_string(), e.to_string()))?;
    url.set_path("/dashboard");
    url.query_pairs_mut()
        .clear()
        .append_pair("shop", shop.as_str());
    Ok(url.into())
}

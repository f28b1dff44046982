//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                 - Connect page (store domain form)
//! GET  /connect          - Normalize the submitted store and start OAuth
//! GET  /dashboard        - Survey dashboard for ?shop=
//! GET  /health           - Liveness check
//! GET  /health/ready     - Readiness check (database ping)
//!
//! # OAuth (plain-text errors)
//! GET  /auth             - Redirect to the Shopify grant page
//! GET  /auth/callback    - Verify, exchange, persist, install script tag
//!
//! # Survey API (JSON errors)
//! GET  /survey/script    - Storefront widget JavaScript
//! POST /survey/submit    - Store a response (CORS: any origin)
//! GET  /survey/stats     - Aggregated stats for ?shop=
//! ```
//!
//! Page routes sit behind [`require_installed_shop`].

pub mod auth;
pub mod health;
pub mod pages;
pub mod survey;

use axum::{
    Router,
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::middleware::require_installed_shop;
use crate::state::AppState;

/// Build a `302 Found` redirect.
///
/// `axum::response::Redirect::to` answers `303 See Other`; Shopify's OAuth
/// handshake and the embedded-app launch expect `302`.
#[must_use]
pub fn redirect_found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// Create the merchant page routes (install-guarded).
pub fn page_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/dashboard", get(pages::dashboard))
        .route_layer(from_fn_with_state(state, require_installed_shop))
}

/// Create the OAuth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::start))
        .route("/callback", get(auth::callback))
}

/// Create the survey API routes router.
pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/script", get(survey::script))
        .route(
            "/submit",
            axum::routing::post(survey::submit)
                .layer(survey::submit_cors())
                .options(survey::submit_preflight),
        )
        .route("/stats", get(survey::stats))
}

/// Create all routes for the app.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(page_routes(state))
        .route("/connect", get(pages::connect))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/survey", survey_routes())
}

/// The full application router with state applied.
pub fn router(state: AppState) -> Router {
    routes(state.clone()).with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_string, get, test_state};
    use super::*;

    #[test]
    fn test_redirect_found() {
        let response = redirect_found("/dashboard?shop=a.myshopify.com");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/dashboard?shop=a.myshopify.com"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let response = get(test_state(None), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = get(test_state(None), "/admin").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

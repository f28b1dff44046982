//! Survey API: widget script, submission intake, and stats.

use askama::Template;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::instrument;

use cart_survey_core::{FoundItems, Satisfaction, ShopDomain, SurveyId};

use crate::error::AppError;
use crate::services::{SurveySubmission, compute_stats, submit_survey};
use crate::shopify::ShopifyError;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Storefront widget injected by the script tag.
#[derive(Template)]
#[template(path = "widget.js", escape = "none")]
pub struct WidgetScriptTemplate {
    pub submit_url: String,
    pub satisfaction_options: Vec<&'static str>,
    pub found_items_options: Vec<&'static str>,
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ShopParams {
    pub shop: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    survey_id: SurveyId,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /survey/script - The storefront widget.
///
/// Served to anonymous storefront visitors; the widget reads the shop from
/// `window.Shopify.shop` at runtime.
///
/// # Errors
///
/// Returns `AppError::Configuration` if `SHOPIFY_APP_URL` is unset, or
/// `AppError::Internal` if the template fails to render.
#[instrument(skip(state))]
pub async fn script(State(state): State<AppState>) -> Result<Response, AppError> {
    let app_url = state.config().require_app_url()?;

    let template = WidgetScriptTemplate {
        submit_url: format!("{app_url}/survey/submit"),
        satisfaction_options: Satisfaction::ALL.iter().map(|s| s.label()).collect(),
        found_items_options: vec![FoundItems::Yes.label(), FoundItems::No.label()],
    };
    let body = template
        .render()
        .map_err(|e| AppError::Internal(format!("widget render failed: {e}")))?;

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript"),
        )],
        body,
    )
        .into_response())
}

/// CORS policy for submissions: any storefront origin may post.
pub fn submit_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// OPTIONS /survey/submit - CORS pre-flight.
pub async fn submit_preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

/// POST /survey/submit - Store one survey response.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed or incomplete body,
/// `AppError::NotFound` for an unknown shop, and `AppError::Database` if the
/// insert fails.
#[instrument(skip(state, body))]
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SurveySubmission>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(submission) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let survey_id = submit_survey(state.pool(), &submission).await?;

    Ok(Json(SubmitResponse {
        success: true,
        survey_id,
    })
    .into_response())
}

/// GET /survey/stats?shop= - Aggregated stats for one shop.
///
/// # Errors
///
/// Returns `AppError::BadRequest` without a valid `shop`, `AppError::NotFound`
/// for an unknown shop, and `AppError::Database` if loading fails.
#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<ShopParams>,
) -> Result<Response, AppError> {
    let shop = params
        .shop
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing shop parameter".to_string()))?;
    let domain = ShopDomain::parse(&shop).map_err(ShopifyError::from)?;

    let survey_stats = compute_stats(state.pool(), &domain).await?;
    Ok(Json(survey_stats).into_response())
}

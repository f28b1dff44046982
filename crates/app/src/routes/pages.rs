//! Merchant-facing pages: connect form and survey dashboard.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use cart_survey_core::{FoundItems, Satisfaction, ShopDomain};

use super::redirect_found;
use crate::error::AppError;
use crate::services::{SurveyStats, compute_stats};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Connect page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub error_message: Option<String>,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shop: String,
    pub total_surveys: u64,
    pub satisfaction_score: String,
    pub found_items_rate: String,
    pub satisfaction_rows: Vec<DistributionRow>,
    pub found_items_rows: Vec<DistributionRow>,
    pub recent: Vec<RecentRow>,
    pub themes: Vec<ThemeRow>,
}

/// One bar of a distribution.
pub struct DistributionRow {
    pub label: &'static str,
    pub count: u64,
    pub percent: String,
}

/// One line of the recent responses table.
pub struct RecentRow {
    pub created_at: String,
    pub satisfaction: &'static str,
    pub found_items: &'static str,
    pub improvements: String,
}

pub struct ThemeRow {
    pub word: String,
    pub count: u64,
}

fn percent_of(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    #[allow(clippy::cast_precision_loss)] // survey counts stay far below 2^52
    let pct = count as f64 * 100.0 / total as f64;
    format!("{pct:.1}%")
}

impl DashboardTemplate {
    fn from_stats(shop: &ShopDomain, stats: &SurveyStats) -> Self {
        let total = stats.total_surveys;
        let row = |label: &'static str, distribution: &std::collections::BTreeMap<String, u64>| {
            let count = distribution.get(label).copied().unwrap_or(0);
            DistributionRow {
                label,
                count,
                percent: percent_of(count, total),
            }
        };

        Self {
            shop: shop.to_string(),
            total_surveys: total,
            satisfaction_score: format!("{:.1}", stats.satisfaction_score),
            found_items_rate: format!("{:.1}%", stats.found_items_rate * 100.0),
            satisfaction_rows: Satisfaction::ALL
                .iter()
                .map(|s| row(s.label(), &stats.satisfaction_distribution))
                .collect(),
            found_items_rows: [FoundItems::Yes, FoundItems::No]
                .iter()
                .map(|f| row(f.label(), &stats.found_items_distribution))
                .collect(),
            recent: stats
                .recent_responses
                .iter()
                .map(|s| RecentRow {
                    created_at: s.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                    satisfaction: s.satisfaction.label(),
                    found_items: s.found_items.label(),
                    improvements: s.improvements.clone(),
                })
                .collect(),
            themes: stats
                .improvement_themes
                .as_slice()
                .iter()
                .map(|(word, count)| ThemeRow {
                    word: word.clone(),
                    count: *count,
                })
                .collect(),
        }
    }
}

fn render(template: &impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response()
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    pub shop: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub shop: Option<String>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET / - Connect form, or the dashboard when Shopify opens an installed app.
#[instrument]
pub async fn home(Query(params): Query<HomeParams>) -> Response {
    if let Some(shop) = params.shop.filter(|s| !s.is_empty()) {
        return ShopDomain::parse(&shop).map_or_else(
            |_| redirect_found("/?error=invalid_domain"),
            |domain| redirect_found(&format!("/dashboard?shop={domain}")),
        );
    }

    let error_message = params.error.as_deref().map(|e| match e {
        "invalid_domain" => "That is not a valid Shopify store domain.".to_string(),
        _ => format!("Error: {e}"),
    });

    render(&HomeTemplate { error_message })
}

/// GET /connect?store= - Normalize free-form store input and start OAuth.
#[instrument]
pub async fn connect(Query(params): Query<ConnectParams>) -> Response {
    let input = params.store.unwrap_or_default();

    match ShopDomain::from_user_input(&input) {
        Ok(domain) => redirect_found(&format!("/auth?shop={domain}")),
        Err(e) => {
            tracing::debug!(%input, error = %e, "Rejected store input");
            redirect_found("/?error=invalid_domain")
        }
    }
}

/// GET /dashboard?shop= - Survey dashboard.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown shop, or `AppError::Database`
/// if the surveys cannot be loaded.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Response, AppError> {
    let Some(shop) = params.shop.filter(|s| !s.is_empty()) else {
        return Ok(redirect_found("/"));
    };
    let Ok(domain) = ShopDomain::parse(&shop) else {
        return Ok(redirect_found("/?error=invalid_domain"));
    };

    let survey_stats = compute_stats(state.pool(), &domain).await?;
    Ok(render(&DashboardTemplate::from_stats(&domain, &survey_stats)))
}

//! Survey statistics for the merchant dashboard.
//!
//! [`SurveyStats::from_surveys`] is a pure fold over a shop's responses;
//! [`compute_stats`] loads them and applies it.
//!
//! Improvement themes are a naive word count: each non-empty comment is split
//! on whitespace and lower-cased, tokens of three characters or fewer are
//! dropped, and the five most frequent tokens are kept. Equal counts rank by
//! first appearance when reading comments newest-first.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlx::PgPool;
use tracing::instrument;

use cart_survey_core::{FoundItems, ShopDomain};

use super::intake::SurveyError;
use crate::db::{ShopRepository, SurveyRepository};
use crate::models::Survey;

/// Number of responses returned in `recentResponses`.
pub const RECENT_LIMIT: usize = 10;

/// Number of words returned in `improvementThemes`.
pub const THEME_LIMIT: usize = 5;

/// Tokens must be longer than this many characters to count as a theme.
const MAX_IGNORED_TOKEN_CHARS: usize = 3;

/// Ranked theme words with their counts.
///
/// Serializes as a JSON object whose keys appear in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeCounts(Vec<(String, u64)>);

impl ThemeCounts {
    /// Themes in rank order.
    #[must_use]
    pub fn as_slice(&self) -> &[(String, u64)] {
        &self.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    fn get(&self, word: &str) -> Option<u64> {
        self.0.iter().find(|(w, _)| w == word).map(|(_, c)| *c)
    }
}

impl Serialize for ThemeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (word, count) in &self.0 {
            map.serialize_entry(word, count)?;
        }
        map.end()
    }
}

/// Aggregated survey data for one shop.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStats {
    pub total_surveys: u64,
    /// Same as `total_surveys`: each survey is one response.
    pub total_responses: u64,
    /// Satisfaction label to count; only labels that occur.
    pub satisfaction_distribution: BTreeMap<String, u64>,
    /// `Yes`/`No` to count; only answers that occur.
    pub found_items_distribution: BTreeMap<String, u64>,
    /// Mean star score (5 = Very Satisfied, 1 = Very Dissatisfied); 0 when empty.
    pub satisfaction_score: f64,
    /// Share of `Yes` answers in `[0, 1]`; 0 when empty.
    pub found_items_rate: f64,
    pub recent_responses: Vec<Survey>,
    pub improvement_themes: ThemeCounts,
}

impl SurveyStats {
    /// Aggregate a shop's surveys.
    ///
    /// Input order does not matter; surveys are ranked newest-first (by
    /// creation time, then id) before recent responses and theme tie-breaks
    /// are taken.
    #[must_use]
    pub fn from_surveys(mut surveys: Vec<Survey>) -> Self {
        surveys.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });

        let mut satisfaction_distribution = BTreeMap::new();
        let mut found_items_distribution = BTreeMap::new();
        let mut score_sum = 0_u64;
        let mut found_yes = 0_u64;

        for survey in &surveys {
            *satisfaction_distribution
                .entry(survey.satisfaction.label().to_string())
                .or_insert(0) += 1;
            *found_items_distribution
                .entry(survey.found_items.label().to_string())
                .or_insert(0) += 1;
            score_sum += u64::from(survey.satisfaction.score());
            if survey.found_items == FoundItems::Yes {
                found_yes += 1;
            }
        }

        let total = surveys.len() as u64;
        let improvement_themes = rank_themes(surveys.iter().map(|s| s.improvements.as_str()));

        #[allow(clippy::cast_precision_loss)] // survey counts stay far below 2^52
        let (satisfaction_score, found_items_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                score_sum as f64 / total as f64,
                found_yes as f64 / total as f64,
            )
        };

        surveys.truncate(RECENT_LIMIT);

        Self {
            total_surveys: total,
            total_responses: total,
            satisfaction_distribution,
            found_items_distribution,
            satisfaction_score,
            found_items_rate,
            recent_responses: surveys,
            improvement_themes,
        }
    }
}

/// Count theme words across `comments` (newest first) and keep the top ones.
fn rank_themes<'a>(comments: impl Iterator<Item = &'a str>) -> ThemeCounts {
    // word -> (count, position of first appearance)
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut position = 0_usize;

    for comment in comments.filter(|c| !c.is_empty()) {
        for token in comment.split_whitespace() {
            let word = token.to_lowercase();
            if word.chars().count() <= MAX_IGNORED_TOKEN_CHARS {
                continue;
            }
            counts
                .entry(word)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
            position += 1;
        }
    }

    let mut ranked: Vec<(String, (u64, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ThemeCounts(
        ranked
            .into_iter()
            .take(THEME_LIMIT)
            .map(|(word, (count, _))| (word, count))
            .collect(),
    )
}

/// Load and aggregate every survey of the shop at `domain`.
///
/// # Errors
///
/// Returns `SurveyError::ShopNotFound` if no installed shop has this domain,
/// or `SurveyError::Repository` if the database fails.
#[instrument(skip(pool), fields(shop = %domain))]
pub async fn compute_stats(pool: &PgPool, domain: &ShopDomain) -> Result<SurveyStats, SurveyError> {
    let shop = ShopRepository::new(pool)
        .get_by_domain(domain)
        .await?
        .ok_or_else(|| SurveyError::ShopNotFound(domain.to_string()))?;

    let surveys = SurveyRepository::new(pool).list_for_shop(shop.id).await?;
    Ok(SurveyStats::from_surveys(surveys))
}

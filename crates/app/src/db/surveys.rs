//! Survey response repository for database operations.
//!
//! Responses are append-only: there is no update or delete path.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cart_survey_core::{FoundItems, Satisfaction, ShopId, SurveyId};

use super::RepositoryError;
use crate::models::{NewSurvey, Survey};

/// Internal row type for `PostgreSQL` survey queries.
#[derive(Debug, sqlx::FromRow)]
struct SurveyRow {
    id: i32,
    shop_id: i32,
    satisfaction: String,
    found_items: String,
    improvements: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SurveyRow> for Survey {
    type Error = RepositoryError;

    fn try_from(row: SurveyRow) -> Result<Self, Self::Error> {
        let satisfaction: Satisfaction = row
            .satisfaction
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("survey {}: {e}", row.id)))?;
        let found_items: FoundItems = row
            .found_items
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("survey {}: {e}", row.id)))?;

        Ok(Self {
            id: SurveyId::new(row.id),
            shop_id: ShopId::new(row.shop_id),
            satisfaction,
            found_items,
            improvements: row.improvements,
            created_at: row.created_at,
        })
    }
}

/// Repository for survey database operations.
pub struct SurveyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SurveyRepository<'a> {
    /// Create a new survey repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a survey response and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, survey: &NewSurvey) -> Result<SurveyId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO app.survey (shop_id, satisfaction, found_items, improvements)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(survey.shop_id)
        .bind(survey.satisfaction.label())
        .bind(survey.found_items.label())
        .bind(&survey.improvements)
        .fetch_one(self.pool)
        .await?;

        Ok(SurveyId::new(id))
    }

    /// List every response for a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored answer is not a
    /// known choice.
    pub async fn list_for_shop(&self, shop_id: ShopId) -> Result<Vec<Survey>, RepositoryError> {
        let rows = sqlx::query_as::<_, SurveyRow>(
            r"
            SELECT id, shop_id, satisfaction, found_items, improvements, created_at
            FROM app.survey
            WHERE shop_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

//! Survey intake from the storefront widget.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use cart_survey_core::{AnswerError, FoundItems, Satisfaction, ShopDomain, SurveyId};

use crate::db::{RepositoryError, ShopRepository, SurveyRepository};
use crate::models::NewSurvey;

/// Errors that can occur when accepting or reading survey data.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// One or more required fields are absent or empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// An answer is not one of the fixed choices.
    #[error(transparent)]
    InvalidAnswer(#[from] AnswerError),

    /// No installed shop has this domain.
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// Database operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// JSON body posted by the widget.
///
/// Every field is optional at the wire level so that missing values are
/// reported together as [`SurveyError::MissingFields`].
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmission {
    pub satisfaction: Option<String>,
    pub found_items: Option<String>,
    pub improvements: Option<String>,
    pub shop: Option<String>,
}

/// A submission whose answers are known choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub satisfaction: Satisfaction,
    pub found_items: FoundItems,
    pub improvements: String,
    pub shop: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl SurveySubmission {
    /// Check required fields and parse the fixed-choice answers.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::MissingFields` naming each absent or empty
    /// required field, or `SurveyError::InvalidAnswer` for an unknown choice.
    pub fn validate(&self) -> Result<ValidatedSubmission, SurveyError> {
        let satisfaction = present(self.satisfaction.as_deref());
        let found_items = present(self.found_items.as_deref());
        let shop = present(self.shop.as_deref());

        let (Some(satisfaction), Some(found_items), Some(shop)) = (satisfaction, found_items, shop)
        else {
            let missing = [
                ("satisfaction", satisfaction),
                ("foundItems", found_items),
                ("shop", shop),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
            return Err(SurveyError::MissingFields(missing));
        };

        Ok(ValidatedSubmission {
            satisfaction: satisfaction.parse()?,
            found_items: found_items.parse()?,
            improvements: self.improvements.clone().unwrap_or_default(),
            shop: shop.to_owned(),
        })
    }
}

/// Validate a submission and store it against its shop.
///
/// A shop value that is not a valid `myshopify.com` domain cannot belong to
/// an installed shop and is reported as not found.
///
/// # Errors
///
/// Returns `SurveyError::MissingFields` or `SurveyError::InvalidAnswer` for a
/// malformed submission, `SurveyError::ShopNotFound` for an unknown shop, and
/// `SurveyError::Repository` if the database fails.
#[instrument(skip_all, fields(shop = ?submission.shop))]
pub async fn submit_survey(
    pool: &PgPool,
    submission: &SurveySubmission,
) -> Result<SurveyId, SurveyError> {
    let valid = submission.validate()?;

    let domain = ShopDomain::parse(&valid.shop)
        .map_err(|_| SurveyError::ShopNotFound(valid.shop.clone()))?;
    let shop = ShopRepository::new(pool)
        .get_by_domain(&domain)
        .await?
        .ok_or_else(|| SurveyError::ShopNotFound(valid.shop.clone()))?;

    let survey_id = SurveyRepository::new(pool)
        .create(&NewSurvey {
            shop_id: shop.id,
            satisfaction: valid.satisfaction,
            found_items: valid.found_items,
            improvements: valid.improvements,
        })
        .await?;

    tracing::info!(survey_id = %survey_id, "Survey stored");
    Ok(survey_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn submission(
        satisfaction: Option<&str>,
        found_items: Option<&str>,
        shop: Option<&str>,
    ) -> SurveySubmission {
        SurveySubmission {
            satisfaction: satisfaction.map(str::to_string),
            found_items: found_items.map(str::to_string),
            improvements: None,
            shop: shop.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_accepts_complete_submission() {
        let valid = submission(Some("Satisfied"), Some("Yes"), Some("my-shop.myshopify.com"))
            .validate()
            .unwrap();

        assert_eq!(valid.satisfaction, Satisfaction::Satisfied);
        assert_eq!(valid.found_items, FoundItems::Yes);
        assert_eq!(valid.improvements, "");
        assert_eq!(valid.shop, "my-shop.myshopify.com");
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = submission(None, Some(""), Some("my-shop.myshopify.com"))
            .validate()
            .unwrap_err();

        assert!(matches!(
            &err,
            SurveyError::MissingFields(fields) if fields == &vec!["satisfaction", "foundItems"]
        ));
        assert_eq!(
            err.to_string(),
            "Missing required fields: satisfaction, foundItems"
        );
    }

    #[test]
    fn test_validate_treats_empty_shop_as_missing() {
        let err = submission(Some("Neutral"), Some("No"), Some(""))
            .validate()
            .unwrap_err();
        assert!(matches!(err, SurveyError::MissingFields(fields) if fields == vec!["shop"]));
    }

    #[test]
    fn test_validate_rejects_unknown_answers() {
        let err = submission(Some("Meh"), Some("Yes"), Some("my-shop.myshopify.com"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, SurveyError::InvalidAnswer(ref e) if e.question == "satisfaction"));

        let err = submission(Some("Neutral"), Some("Maybe"), Some("my-shop.myshopify.com"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, SurveyError::InvalidAnswer(ref e) if e.question == "foundItems"));
    }

    #[test]
    fn test_submission_deserializes_camel_case() {
        let body: SurveySubmission = serde_json::from_str(
            r#"{"satisfaction":"Neutral","foundItems":"No","improvements":"faster shipping","shop":"a.myshopify.com"}"#,
        )
        .unwrap();
        let valid = body.validate().unwrap();
        assert_eq!(valid.improvements, "faster shipping");
    }
}

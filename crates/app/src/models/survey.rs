//! Survey response domain models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use cart_survey_core::{FoundItems, Satisfaction, ShopId, SurveyId};

/// A stored survey response. Immutable once created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: SurveyId,
    #[serde(skip)]
    pub shop_id: ShopId,
    pub satisfaction: Satisfaction,
    pub found_items: FoundItems,
    /// Free-text comment; empty when the customer left it blank.
    pub improvements: String,
    #[serde(serialize_with = "serialize_millis")]
    pub created_at: DateTime<Utc>,
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2026-03-01T09:30:00.000Z`.
fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A validated response ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurvey {
    pub shop_id: ShopId,
    pub satisfaction: Satisfaction,
    pub found_items: FoundItems,
    pub improvements: String,
}

//! Survey answer enums.
//!
//! The storefront widget offers fixed choices for both closed questions. The
//! wire and storage form of each variant is its human-readable label, e.g.
//! `"Very Satisfied"`, which is also the key used in dashboard distributions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a label does not match any fixed answer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {question} answer: {value:?}")]
pub struct AnswerError {
    /// Which question the value was given for.
    pub question: &'static str,
    /// The rejected value.
    pub value: String,
}

/// "How satisfied are you with your shopping experience?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Satisfaction {
    #[serde(rename = "Very Satisfied")]
    VerySatisfied,
    #[serde(rename = "Satisfied")]
    Satisfied,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Dissatisfied")]
    Dissatisfied,
    #[serde(rename = "Very Dissatisfied")]
    VeryDissatisfied,
}

impl Satisfaction {
    /// All levels, most satisfied first (the order the widget shows them).
    pub const ALL: [Self; 5] = [
        Self::VerySatisfied,
        Self::Satisfied,
        Self::Neutral,
        Self::Dissatisfied,
        Self::VeryDissatisfied,
    ];

    /// Label shown to customers and stored in the database.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VerySatisfied => "Very Satisfied",
            Self::Satisfied => "Satisfied",
            Self::Neutral => "Neutral",
            Self::Dissatisfied => "Dissatisfied",
            Self::VeryDissatisfied => "Very Dissatisfied",
        }
    }

    /// Star score used for the dashboard's overall satisfaction (5 = best).
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::VerySatisfied => 5,
            Self::Satisfied => 4,
            Self::Neutral => 3,
            Self::Dissatisfied => 2,
            Self::VeryDissatisfied => 1,
        }
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Satisfaction {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.label() == s)
            .ok_or_else(|| AnswerError {
                question: "satisfaction",
                value: s.to_owned(),
            })
    }
}

/// "Did you find everything you were looking for?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FoundItems {
    Yes,
    No,
}

impl FoundItems {
    /// Label shown to customers and stored in the database.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl fmt::Display for FoundItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FoundItems {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Self::Yes),
            "No" => Ok(Self::No),
            _ => Err(AnswerError {
                question: "foundItems",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfaction_labels_parse_back() {
        for level in Satisfaction::ALL {
            assert_eq!(level.label().parse::<Satisfaction>().unwrap(), level);
        }
    }

    #[test]
    fn test_satisfaction_rejects_unknown_and_case_variants() {
        let err = "very satisfied".parse::<Satisfaction>().unwrap_err();
        assert_eq!(err.question, "satisfaction");
        assert_eq!(
            err.to_string(),
            "invalid satisfaction answer: \"very satisfied\""
        );
        assert!("Ecstatic".parse::<Satisfaction>().is_err());
    }

    #[test]
    fn test_satisfaction_scores_descend() {
        let scores: Vec<u8> = Satisfaction::ALL.iter().map(|s| s.score()).collect();
        assert_eq!(scores, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_satisfaction_serde_uses_labels() {
        let json = serde_json::to_string(&Satisfaction::VeryDissatisfied).unwrap();
        assert_eq!(json, "\"Very Dissatisfied\"");
        let parsed: Satisfaction = serde_json::from_str("\"Neutral\"").unwrap();
        assert_eq!(parsed, Satisfaction::Neutral);
    }

    #[test]
    fn test_found_items() {
        assert_eq!("Yes".parse::<FoundItems>().unwrap(), FoundItems::Yes);
        assert_eq!("No".parse::<FoundItems>().unwrap(), FoundItems::No);
        assert!("yes".parse::<FoundItems>().is_err());
        assert_eq!(FoundItems::No.to_string(), "No");
    }
}

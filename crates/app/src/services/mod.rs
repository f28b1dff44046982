//! Business logic services.
//!
//! # Services
//!
//! - `install` - OAuth callback orchestration (token, metadata, upsert, script tag)
//! - `intake` - Validating and storing survey submissions from the storefront
//! - `stats` - Per-shop survey aggregation for the dashboard

pub mod install;
pub mod intake;
pub mod stats;

pub use install::{InstallError, complete_install, widget_script_url};
pub use intake::{SurveyError, SurveySubmission, submit_survey};
pub use stats::{SurveyStats, ThemeCounts, compute_stats};

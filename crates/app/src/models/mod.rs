//! Domain models for the survey app.

pub mod shop;
pub mod survey;

pub use shop::Shop;
pub use survey::{NewSurvey, Survey};

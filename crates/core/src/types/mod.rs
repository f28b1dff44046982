//! Core types for Cart Survey.
//!
//! This module provides type-safe wrappers for the app's domain concepts.

pub mod answer;
pub mod id;
pub mod shop_domain;

pub use answer::{AnswerError, FoundItems, Satisfaction};
pub use id::*;
pub use shop_domain::{SHOP_DOMAIN_SUFFIX, ShopDomain, ShopDomainError, is_valid_shop_domain};

//! Shopify shop domain type.
//!
//! Every outbound call to the Shopify REST Admin API is addressed to
//! `https://<shop>/...`, where `<shop>` comes from a query parameter the
//! merchant (or an attacker) controls. Only hosted-store domains are accepted,
//! which keeps those calls on Shopify's infrastructure.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Literal suffix of every Shopify hosted-store domain.
pub const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input does not end with `.myshopify.com`.
    #[error("shop domain must end with {SHOP_DOMAIN_SUFFIX}")]
    WrongSuffix,
    /// Nothing precedes the suffix.
    #[error("shop domain is missing the store name")]
    EmptyStoreName,
    /// The store name starts with a hyphen.
    #[error("store name cannot start with a hyphen")]
    LeadingHyphen,
    /// The store name contains something other than ASCII letters, digits or hyphens.
    #[error("store name contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A validated `<store>.myshopify.com` domain.
///
/// ## Constraints
///
/// - Store name: one or more ASCII alphanumeric or `-` characters
/// - Store name must not start with `-`
/// - Followed by exactly `.myshopify.com`
///
/// ## Examples
///
/// ```
/// use cart_survey_core::ShopDomain;
///
/// assert!(ShopDomain::parse("my-shop.myshopify.com").is_ok());
///
/// assert!(ShopDomain::parse("-bad.myshopify.com").is_err());
/// assert!(ShopDomain::parse("shop.com").is_err());
/// assert!(ShopDomain::parse("shop.myshopify.com.evil.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Parse a `ShopDomain` from a string, exactly as received.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not match the hosted-store grammar.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let store = s
            .strip_suffix(SHOP_DOMAIN_SUFFIX)
            .ok_or(ShopDomainError::WrongSuffix)?;

        let first = store.chars().next().ok_or(ShopDomainError::EmptyStoreName)?;
        if first == '-' {
            return Err(ShopDomainError::LeadingHyphen);
        }

        if let Some(bad) = store
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(ShopDomainError::InvalidCharacter(bad));
        }

        Ok(Self(s.to_owned()))
    }

    /// Parse loosely typed merchant input from the connect form.
    ///
    /// Trims whitespace, lower-cases, drops a leading `http://` or `https://`
    /// and a trailing `/`, and appends `.myshopify.com` when the input does not
    /// already contain it. The result must still satisfy [`ShopDomain::parse`].
    ///
    /// ```
    /// use cart_survey_core::ShopDomain;
    ///
    /// let shop = ShopDomain::from_user_input(" https://My-Shop.myshopify.com/ ").unwrap();
    /// assert_eq!(shop.as_str(), "my-shop.myshopify.com");
    ///
    /// let shop = ShopDomain::from_user_input("my-shop").unwrap();
    /// assert_eq!(shop.as_str(), "my-shop.myshopify.com");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized input is not a valid shop domain.
    pub fn from_user_input(input: &str) -> Result<Self, ShopDomainError> {
        let lowered = input.trim().to_lowercase();
        let without_scheme = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        let host = without_scheme.strip_suffix('/').unwrap_or(without_scheme);

        if host.contains(SHOP_DOMAIN_SUFFIX) {
            Self::parse(host)
        } else {
            Self::parse(&format!("{host}{SHOP_DOMAIN_SUFFIX}"))
        }
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `shop` is a valid `<store>.myshopify.com` domain.
#[must_use]
pub fn is_valid_shop_domain(shop: &str) -> bool {
    ShopDomain::parse(shop).is_ok()
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_hosted_store_domains() {
        assert!(is_valid_shop_domain("my-shop.myshopify.com"));
        assert!(is_valid_shop_domain("shop123.myshopify.com"));
        assert!(is_valid_shop_domain("A1.myshopify.com"));
        assert!(is_valid_shop_domain("x-.myshopify.com"));
    }

    #[test]
    fn test_rejects_leading_hyphen() {
        assert_eq!(
            ShopDomain::parse("-bad.myshopify.com"),
            Err(ShopDomainError::LeadingHyphen)
        );
    }

    #[test]
    fn test_rejects_foreign_domains() {
        assert_eq!(
            ShopDomain::parse("shop.com"),
            Err(ShopDomainError::WrongSuffix)
        );
        assert_eq!(
            ShopDomain::parse("shop.myshopify.com.evil.com"),
            Err(ShopDomainError::WrongSuffix)
        );
    }

    #[test]
    fn test_rejects_empty_and_bare_suffix() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::EmptyStoreName)
        );
    }

    #[test]
    fn test_rejects_dots_and_path_tricks_in_store_name() {
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter('.'))
        );
        assert_eq!(
            ShopDomain::parse("evil@host.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter('@'))
        );
        assert!(!is_valid_shop_domain("sub.shop.myshopify.com"));
    }

    #[test]
    fn test_from_user_input_normalizes() {
        let shop = ShopDomain::from_user_input("  HTTPS://Cool-Store.myshopify.com/").unwrap();
        assert_eq!(shop.as_str(), "cool-store.myshopify.com");

        let shop = ShopDomain::from_user_input("http://cool-store").unwrap();
        assert_eq!(shop.as_str(), "cool-store.myshopify.com");
    }

    #[test]
    fn test_from_user_input_still_validates() {
        assert!(ShopDomain::from_user_input("-nope").is_err());
        assert!(ShopDomain::from_user_input("my shop").is_err());
        assert!(ShopDomain::from_user_input("").is_err());
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let shop: ShopDomain = serde_json::from_str("\"my-shop.myshopify.com\"").unwrap();
        assert_eq!(serde_json::to_string(&shop).unwrap(), "\"my-shop.myshopify.com\"");

        assert!(serde_json::from_str::<ShopDomain>("\"shop.com\"").is_err());
    }
}

//! Shop repository for database operations.
//!
//! A shop row is written once per OAuth install and refreshed on reinstall.
//! The application never deletes shops.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use cart_survey_core::{ShopDomain, ShopId};

use super::RepositoryError;
use crate::models::Shop;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` shop queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: i32,
    shop_id: String,
    domain: String,
    name: String,
    access_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let domain = ShopDomain::parse(&row.domain).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop domain in database: {e}"))
        })?;

        Ok(Self {
            id: ShopId::new(row.id),
            shop_id: row.shop_id,
            domain,
            name: row.name,
            access_token: SecretString::from(row.access_token),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a shop, or refresh its name and access token if the Shopify
    /// shop id is already known.
    ///
    /// The domain and the Shopify shop id of an existing row are never
    /// changed. Concurrent reinstalls of the same shop resolve inside the
    /// single statement; the last writer's token wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the domain already belongs to a
    /// different Shopify shop id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        domain: &ShopDomain,
        shop_id: &str,
        name: &str,
        access_token: &SecretString,
    ) -> Result<Shop, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            INSERT INTO app.shop (shop_id, domain, name, access_token)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop_id) DO UPDATE SET
                name = EXCLUDED.name,
                access_token = EXCLUDED.access_token,
                updated_at = NOW()
            RETURNING id, shop_id, domain, name, access_token, created_at, updated_at
            ",
        )
        .bind(shop_id)
        .bind(domain)
        .bind(name)
        .bind(access_token.expose_secret())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("domain {domain} belongs to another shop"))
            }
            other => RepositoryError::Database(other),
        })?;

        row.try_into()
    }

    /// Get a shop by its `myshopify.com` domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_domain(
        &self,
        domain: &ShopDomain,
    ) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            SELECT id, shop_id, domain, name, access_token, created_at, updated_at
            FROM app.shop
            WHERE domain = $1
            ",
        )
        .bind(domain)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Returns `true` if `domain` has a stored, non-empty access token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_access_token(&self, domain: &ShopDomain) -> Result<bool, RepositoryError> {
        let installed = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM app.shop WHERE domain = $1 AND access_token <> ''
            )
            ",
        )
        .bind(domain)
        .fetch_one(self.pool)
        .await?;

        Ok(installed)
    }
}

//! Delivery option repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use rinkside_core::{DeliveryOptionId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::delivery_option::{DeliveryOption, DeliveryOptionFields};

const DUPLICATE_NAME: &str = "Name has already been taken";

#[derive(Debug, FromRow)]
struct DeliveryOptionRow {
    id: DeliveryOptionId,
    seller_id: UserId,
    name: String,
    duration: String,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeliveryOptionRow> for DeliveryOption {
    fn from(row: DeliveryOptionRow) -> Self {
        Self {
            id: row.id,
            seller_id: row.seller_id,
            name: row.name,
            duration: row.duration,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for delivery option database operations.
pub struct DeliveryOptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryOptionRepository<'a> {
    /// Create a new delivery option repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A seller's options in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<DeliveryOption>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryOptionRow>(
            r"
            SELECT id, seller_id, name, duration, price, created_at, updated_at
            FROM rinkside.delivery_option
            WHERE seller_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(DeliveryOption::from).collect())
    }

    /// A seller's options, cheapest first (checkout view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller_price(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<DeliveryOption>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryOptionRow>(
            r"
            SELECT id, seller_id, name, duration, price, created_at, updated_at
            FROM rinkside.delivery_option
            WHERE seller_id = $1
            ORDER BY price ASC, id ASC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(DeliveryOption::from).collect())
    }

    /// Get an option by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DeliveryOptionId) -> Result<Option<DeliveryOption>, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryOptionRow>(
            r"
            SELECT id, seller_id, name, duration, price, created_at, updated_at
            FROM rinkside.delivery_option
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(DeliveryOption::from))
    }

    /// Create an option for `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the seller already has an option
    /// with this name.
    pub async fn create(
        &self,
        seller_id: UserId,
        fields: &DeliveryOptionFields,
    ) -> Result<DeliveryOption, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryOptionRow>(
            r"
            INSERT INTO rinkside.delivery_option (seller_id, name, duration, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, seller_id, name, duration, price, created_at, updated_at
            ",
        )
        .bind(seller_id)
        .bind(&fields.name)
        .bind(&fields.duration)
        .bind(fields.price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        Ok(row.into())
    }

    /// Replace an option's attributes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option does not exist.
    /// Returns `RepositoryError::Conflict` on a duplicate name.
    pub async fn update(
        &self,
        id: DeliveryOptionId,
        fields: &DeliveryOptionFields,
    ) -> Result<DeliveryOption, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryOptionRow>(
            r"
            UPDATE rinkside.delivery_option
            SET name = $2, duration = $3, price = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, seller_id, name, duration, price, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.duration)
        .bind(fields.price)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option does not exist.
    pub async fn delete(&self, id: DeliveryOptionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM rinkside.delivery_option WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

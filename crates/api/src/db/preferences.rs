//! Site preference repository.
//!
//! The table holds exactly one row. It is seeded by [`PreferenceRepository::initialize`]
//! at startup (and by `rinkside-cli preferences init`), never on read.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::RepositoryError;
use crate::models::preference::{DEFAULT_FAVORITE_NUMBER, DEFAULT_OWNER_NAME, SitePreference};

#[derive(Debug, FromRow)]
struct PreferenceRow {
    owner_name: String,
    favorite_number: i32,
    updated_at: DateTime<Utc>,
}

impl From<PreferenceRow> for SitePreference {
    fn from(row: PreferenceRow) -> Self {
        Self {
            owner_name: row.owner_name,
            favorite_number: row.favorite_number,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for the site preference row.
pub struct PreferenceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PreferenceRepository<'a> {
    /// Create a new preference repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the default row if it does not exist. Returns whether a row was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn initialize(&self) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO rinkside.site_preference (id, owner_name, favorite_number)
            VALUES (TRUE, $1, $2)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(DEFAULT_OWNER_NAME)
        .bind(DEFAULT_FAVORITE_NUMBER)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Read the preference row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row was never initialized.
    pub async fn get(&self) -> Result<SitePreference, RepositoryError> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            "SELECT owner_name, favorite_number, updated_at FROM rinkside.site_preference",
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Set the favorite number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row was never initialized.
    pub async fn set_favorite_number(&self, number: i32) -> Result<SitePreference, RepositoryError> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            r"
            UPDATE rinkside.site_preference
            SET favorite_number = $1, updated_at = NOW()
            RETURNING owner_name, favorite_number, updated_at
            ",
        )
        .bind(number)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

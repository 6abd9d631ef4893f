//! Card repository for database operations.
//!
//! Listing queries are assembled with [`QueryBuilder`] so that every optional
//! filter becomes a bound parameter.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use rinkside_core::{CardCondition, CardId, GradingCompany, Rarity, UserId};

use super::RepositoryError;
use crate::models::card::{Card, CardFields, Grading};
use crate::models::query::{CardFilter, CardSort, Pagination, like_pattern};

/// Writable columns, in bind order (see [`bind_fields`]).
const FIELD_COLUMNS: [&str; 40] = [
    "player_name",
    "team",
    "position",
    "jersey_number",
    "manufacturer",
    "set_name",
    "card_number",
    "year",
    "series",
    "parallel_variant",
    "serial_number",
    "rookie_card",
    "autographed",
    "memorabilia",
    "memorabilia_type",
    "short_print",
    "condition",
    "graded",
    "grading_company",
    "grade",
    "grade_details",
    "rarity",
    "estimated_value",
    "purchase_price",
    "last_sold_price",
    "card_size",
    "card_stock",
    "foil_treatment",
    "front_image_url",
    "back_image_url",
    "detail_image_urls",
    "for_sale",
    "asking_price",
    "price_negotiable",
    "trade_only",
    "acquired_date",
    "acquired_from",
    "pack_details",
    "description",
    "tags",
];

static CARD_COLUMNS: LazyLock<String> = LazyLock::new(|| {
    format!(
        "id, owner_id, {}, card_popularity, created_at, updated_at",
        FIELD_COLUMNS.join(", ")
    )
});

static INSERT_SQL: LazyLock<String> = LazyLock::new(|| {
    let placeholders: Vec<String> = (2..=FIELD_COLUMNS.len() + 1).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO rinkside.card (owner_id, {}) VALUES ($1, {}) RETURNING {}",
        FIELD_COLUMNS.join(", "),
        placeholders.join(", "),
        *CARD_COLUMNS
    )
});

static UPDATE_SQL: LazyLock<String> = LazyLock::new(|| {
    let assignments: Vec<String> = FIELD_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = ${}", i + 2))
        .collect();
    format!(
        "UPDATE rinkside.card SET {}, updated_at = NOW() WHERE id = $1 RETURNING {}",
        assignments.join(", "),
        *CARD_COLUMNS
    )
});

#[derive(Debug, FromRow)]
struct CardRow {
    id: CardId,
    owner_id: UserId,
    player_name: String,
    team: Option<String>,
    position: Option<String>,
    jersey_number: Option<i32>,
    manufacturer: String,
    set_name: String,
    card_number: String,
    year: i32,
    series: Option<String>,
    parallel_variant: Option<String>,
    serial_number: Option<String>,
    rookie_card: bool,
    autographed: bool,
    memorabilia: bool,
    memorabilia_type: Option<String>,
    short_print: bool,
    condition: String,
    graded: bool,
    grading_company: Option<String>,
    grade: Option<String>,
    grade_details: Json<Map<String, Value>>,
    rarity: Option<String>,
    estimated_value: Option<Decimal>,
    purchase_price: Option<Decimal>,
    last_sold_price: Option<Decimal>,
    card_size: String,
    card_stock: Option<String>,
    foil_treatment: Option<String>,
    front_image_url: String,
    back_image_url: Option<String>,
    detail_image_urls: Vec<String>,
    for_sale: bool,
    asking_price: Option<Decimal>,
    price_negotiable: bool,
    trade_only: bool,
    acquired_date: Option<NaiveDate>,
    acquired_from: Option<String>,
    pack_details: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    card_popularity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(id: CardId, what: &str, e: &str) -> RepositoryError {
    RepositoryError::DataCorruption(format!("card {id}: invalid {what} in database: {e}"))
}

impl TryFrom<CardRow> for Card {
    type Error = RepositoryError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let condition = row
            .condition
            .parse::<CardCondition>()
            .map_err(|e| corrupt(id, "condition", &e))?;
        let rarity = row
            .rarity
            .as_deref()
            .map(str::parse::<Rarity>)
            .transpose()
            .map_err(|e| corrupt(id, "rarity", &e))?;
        let grading = match (row.graded, row.grading_company, row.grade) {
            (false, _, _) => None,
            (true, Some(company), Some(grade)) => Some(Grading {
                company: company
                    .parse::<GradingCompany>()
                    .map_err(|e| corrupt(id, "grading company", &e))?,
                grade,
            }),
            (true, _, _) => return Err(corrupt(id, "grading", "graded without company and grade")),
        };

        Ok(Self {
            id,
            owner_id: row.owner_id,
            fields: CardFields {
                player_name: row.player_name,
                team: row.team,
                position: row.position,
                jersey_number: row.jersey_number,
                manufacturer: row.manufacturer,
                set_name: row.set_name,
                card_number: row.card_number,
                year: row.year,
                series: row.series,
                parallel_variant: row.parallel_variant,
                serial_number: row.serial_number,
                rookie_card: row.rookie_card,
                autographed: row.autographed,
                memorabilia: row.memorabilia,
                memorabilia_type: row.memorabilia_type,
                short_print: row.short_print,
                condition,
                grading,
                grade_details: row.grade_details.0,
                rarity,
                estimated_value: row.estimated_value,
                purchase_price: row.purchase_price,
                last_sold_price: row.last_sold_price,
                card_size: row.card_size,
                card_stock: row.card_stock,
                foil_treatment: row.foil_treatment,
                front_image_url: row.front_image_url,
                back_image_url: row.back_image_url,
                detail_image_urls: row.detail_image_urls,
                for_sale: row.for_sale,
                asking_price: row.asking_price,
                price_negotiable: row.price_negotiable,
                trade_only: row.trade_only,
                acquired_date: row.acquired_date,
                acquired_from: row.acquired_from,
                pack_details: row.pack_details,
                description: row.description,
                tags: row.tags,
            },
            card_popularity: row.card_popularity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

type CardQueryAs<'q> = QueryAs<'q, Postgres, CardRow, PgArguments>;

/// Bind every writable column in [`FIELD_COLUMNS`] order.
fn bind_fields<'q>(query: CardQueryAs<'q>, f: &'q CardFields) -> CardQueryAs<'q> {
    let grading_company = f.grading.as_ref().map(|g| g.company.as_str());
    let grade = f.grading.as_ref().map(|g| g.grade.as_str());

    query
        .bind(&f.player_name)
        .bind(&f.team)
        .bind(&f.position)
        .bind(f.jersey_number)
        .bind(&f.manufacturer)
        .bind(&f.set_name)
        .bind(&f.card_number)
        .bind(f.year)
        .bind(&f.series)
        .bind(&f.parallel_variant)
        .bind(&f.serial_number)
        .bind(f.rookie_card)
        .bind(f.autographed)
        .bind(f.memorabilia)
        .bind(&f.memorabilia_type)
        .bind(f.short_print)
        .bind(f.condition.as_str())
        .bind(f.graded())
        .bind(grading_company)
        .bind(grade)
        .bind(Json(&f.grade_details))
        .bind(f.rarity.as_ref().map(Rarity::as_str))
        .bind(f.estimated_value)
        .bind(f.purchase_price)
        .bind(f.last_sold_price)
        .bind(&f.card_size)
        .bind(&f.card_stock)
        .bind(&f.foil_treatment)
        .bind(&f.front_image_url)
        .bind(&f.back_image_url)
        .bind(&f.detail_image_urls)
        .bind(f.for_sale)
        .bind(f.asking_price)
        .bind(f.price_negotiable)
        .bind(f.trade_only)
        .bind(f.acquired_date)
        .bind(&f.acquired_from)
        .bind(&f.pack_details)
        .bind(&f.description)
        .bind(&f.tags)
}

/// Append `WHERE` predicates for `filter`.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CardFilter) {
    qb.push(" WHERE TRUE");

    let substrings = [
        ("player_name", &filter.player),
        ("team", &filter.team),
        ("set_name", &filter.set_name),
    ];
    for (column, value) in substrings {
        if let Some(text) = value {
            qb.push(format_args!(" AND {column} ILIKE "))
                .push_bind(like_pattern(text));
        }
    }

    let exact = [
        ("manufacturer", &filter.manufacturer),
        ("condition", &filter.condition),
        ("rarity", &filter.rarity),
        ("grading_company", &filter.grading_company),
    ];
    for (column, value) in exact {
        if let Some(text) = value {
            qb.push(format_args!(" AND {column} = ")).push_bind(text.clone());
        }
    }

    if let Some(year) = filter.year {
        qb.push(" AND year = ").push_bind(year);
    }

    let flags = [
        ("rookie_card", filter.rookie),
        ("autographed", filter.autographed),
        ("graded", filter.graded),
        ("for_sale", filter.for_sale),
    ];
    for (column, set) in flags {
        if set {
            qb.push(format_args!(" AND {column}"));
        }
    }

    if let Some(min) = filter.min_price {
        qb.push(" AND asking_price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND asking_price <= ").push_bind(max);
    }
    if let Some(owner_id) = filter.owner_id {
        qb.push(" AND owner_id = ").push_bind(owner_id);
    }

    if let Some(text) = &filter.search {
        let pattern = like_pattern(text);
        qb.push(" AND (player_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR team ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR manufacturer ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR set_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Ownership and sale state of a card locked for settlement.
#[derive(Debug, Clone, Copy)]
pub struct LockedListing {
    pub owner_id: UserId,
    pub for_sale: bool,
}

/// Repository for card database operations.
pub struct CardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CardRepository<'a> {
    /// Create a new card repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        filter: &CardFilter,
        sort: CardSort,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Card>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM rinkside.card", *CARD_COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ").push(sort.order_by());
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if offset > 0 {
            qb.push(" OFFSET ").push_bind(offset);
        }

        let rows = qb.build_query_as::<CardRow>().fetch_all(self.pool).await?;
        rows.into_iter().map(Card::try_from).collect()
    }

    /// Count cards matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &CardFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM rinkside.card");
        push_filters(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of matching cards plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored enum value is invalid.
    pub async fn list(
        &self,
        filter: &CardFilter,
        sort: CardSort,
        page: Pagination,
    ) -> Result<(Vec<Card>, i64), RepositoryError> {
        let total = self.count(filter).await?;
        let cards = self
            .fetch(filter, sort, Some(page.per_page), page.offset())
            .await?;
        Ok((cards, total))
    }

    /// Every matching card, unpaginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        filter: &CardFilter,
        sort: CardSort,
    ) -> Result<Vec<Card>, RepositoryError> {
        self.fetch(filter, sort, None, 0).await
    }

    /// At most `limit` matching cards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &CardFilter,
        sort: CardSort,
        limit: i64,
    ) -> Result<Vec<Card>, RepositoryError> {
        self.fetch(filter, sort, Some(limit), 0).await
    }

    /// Get a card by ID without side effects.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CardId) -> Result<Option<Card>, RepositoryError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {} FROM rinkside.card WHERE id = $1",
            *CARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Card::try_from).transpose()
    }

    /// Get a card for a detail view, counting the view.
    ///
    /// The increment and read happen in one statement, so concurrent views
    /// are never lost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn view(&self, id: CardId) -> Result<Option<Card>, RepositoryError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "UPDATE rinkside.card SET card_popularity = card_popularity + 1 \
             WHERE id = $1 RETURNING {}",
            *CARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Card::try_from).transpose()
    }

    /// Insert a validated card owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner_id: UserId,
        fields: &CardFields,
    ) -> Result<Card, RepositoryError> {
        let query = sqlx::query_as::<_, CardRow>(&INSERT_SQL).bind(owner_id);
        let row = bind_fields(query, fields).fetch_one(self.pool).await?;
        Card::try_from(row)
    }

    /// Replace every writable column of a card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the card no longer exists.
    pub async fn update(&self, id: CardId, fields: &CardFields) -> Result<Card, RepositoryError> {
        let query = sqlx::query_as::<_, CardRow>(&UPDATE_SQL).bind(id);
        let row = bind_fields(query, fields)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Card::try_from(row)
    }

    /// Delete a card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the card does not exist.
    pub async fn delete(&self, id: CardId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM rinkside.card WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Lock a card row for the remainder of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_settlement(
        conn: &mut PgConnection,
        id: CardId,
    ) -> Result<Option<LockedListing>, RepositoryError> {
        let row: Option<(UserId, bool)> =
            sqlx::query_as("SELECT owner_id, for_sale FROM rinkside.card WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;

        Ok(row.map(|(owner_id, for_sale)| LockedListing { owner_id, for_sale }))
    }

    /// Take a sold card off the market.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_sold(conn: &mut PgConnection, id: CardId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE rinkside.card SET for_sale = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_sql_binds_every_column() {
        assert!(INSERT_SQL.contains("$41"));
        assert!(!INSERT_SQL.contains("$42"));
        assert!(UPDATE_SQL.contains("tags = $41"));
        assert!(UPDATE_SQL.starts_with("UPDATE rinkside.card SET player_name = $2,"));
    }

    #[test]
    fn test_push_filters_binds_user_text() {
        let filter = CardFilter {
            player: Some("O'Reilly".to_string()),
            year: Some(2023),
            rookie: true,
            search: Some("mcdavid".to_string()),
            ..CardFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rinkside.card");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();

        assert!(!sql.contains("O'Reilly"));
        assert!(!sql.contains("mcdavid"));
        assert!(sql.contains("player_name ILIKE $1"));
        assert!(sql.contains("year = $2"));
        assert!(sql.contains("AND rookie_card"));
        assert!(sql.contains("OR set_name ILIKE $6)"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rinkside.card");
        push_filters(&mut qb, &CardFilter::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM rinkside.card WHERE TRUE");
    }
}

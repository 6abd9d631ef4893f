//! Purchase repository for database operations.
//!
//! Purchases are insert-only. [`PurchaseRepository::settle`] is the one
//! multi-statement transaction in the service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

use rinkside_core::{Buyer, CardId, DeliveryOptionId, PurchaseId, PurchaseStatus, UserId};

use super::cards::CardRepository;
use super::{RepositoryError, conflict_on_unique};
use crate::models::purchase::{NewPurchase, Purchase};

const PURCHASE_COLUMNS: &str = "id, card_id, seller_id, buyer_id, delivery_option_id, amount, \
                                status, payment_intent_id, created_at, updated_at";

const DUPLICATE_INTENT: &str = "purchase already recorded for payment intent";

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    card_id: CardId,
    seller_id: UserId,
    buyer_id: Option<UserId>,
    delivery_option_id: Option<DeliveryOptionId>,
    amount: Decimal,
    status: String,
    payment_intent_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = RepositoryError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PurchaseStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid purchase status in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            card_id: row.card_id,
            seller_id: row.seller_id,
            buyer: Buyer::from_user(row.buyer_id),
            delivery_option_id: row.delivery_option_id,
            amount: row.amount,
            status,
            payment_intent_id: row.payment_intent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Result of settling a successful payment.
#[derive(Debug)]
pub enum Settlement {
    /// The purchase was recorded and the card taken off the market.
    Completed(Purchase),
    /// A purchase for this payment intent already exists; nothing changed.
    AlreadyRecorded(Purchase),
    /// The card was deleted or is no longer for sale; nothing changed.
    CardUnavailable,
}

/// Repository for purchase database operations.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the purchase recorded for a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Purchase>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_intent(&mut conn, payment_intent_id).await
    }

    /// Purchases where `user_id` is the buyer or the seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r"
            SELECT {PURCHASE_COLUMNS}
            FROM rinkside.purchase
            WHERE buyer_id = $1 OR seller_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Purchase::try_from).collect()
    }

    /// Insert a purchase outside of settlement (refunded or pending records).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment intent is already recorded.
    pub async fn record(&self, purchase: &NewPurchase) -> Result<Purchase, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, purchase).await
    }

    /// Record a completed purchase and take the card off the market, atomically.
    ///
    /// The card row is locked before anything else is read, so concurrent
    /// deliveries for the same card are serialized: the first one settles and
    /// the rest see either their own earlier purchase or an unavailable card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another transaction recorded the
    /// same payment intent first. The transaction is rolled back.
    pub async fn settle(&self, purchase: &NewPurchase) -> Result<Settlement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let listing = CardRepository::lock_for_settlement(&mut tx, purchase.card_id).await?;

        if let Some(existing) = find_by_intent(&mut tx, &purchase.payment_intent_id).await? {
            tx.rollback().await?;
            return Ok(Settlement::AlreadyRecorded(existing));
        }

        match listing {
            Some(listing) if listing.for_sale => {}
            _ => {
                tx.rollback().await?;
                return Ok(Settlement::CardUnavailable);
            }
        }

        let recorded = insert(&mut tx, purchase).await?;
        CardRepository::mark_sold(&mut tx, purchase.card_id).await?;
        tx.commit().await?;

        Ok(Settlement::Completed(recorded))
    }
}

async fn find_by_intent(
    conn: &mut PgConnection,
    payment_intent_id: &str,
) -> Result<Option<Purchase>, RepositoryError> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM rinkside.purchase WHERE payment_intent_id = $1"
    ))
    .bind(payment_intent_id)
    .fetch_optional(conn)
    .await?;

    row.map(Purchase::try_from).transpose()
}

async fn insert(conn: &mut PgConnection, purchase: &NewPurchase) -> Result<Purchase, RepositoryError> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        r"
        INSERT INTO rinkside.purchase
            (card_id, seller_id, buyer_id, delivery_option_id, amount, status, payment_intent_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PURCHASE_COLUMNS}
        "
    ))
    .bind(purchase.card_id)
    .bind(purchase.seller_id)
    .bind(purchase.buyer.user_id())
    .bind(purchase.delivery_option_id)
    .bind(purchase.amount)
    .bind(purchase.status.as_str())
    .bind(&purchase.payment_intent_id)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, DUPLICATE_INTENT))?;

    Purchase::try_from(row)
}

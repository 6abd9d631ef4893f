//! Purchase records written by the payment orchestrator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rinkside_core::price::platform_fee;
use rinkside_core::{Buyer, CardId, DeliveryOptionId, PurchaseId, PurchaseStatus, UserId};

/// A settled (or refunded) payment for one card.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub id: PurchaseId,
    pub card_id: CardId,
    pub seller_id: UserId,
    pub buyer: Buyer,
    pub delivery_option_id: Option<DeliveryOptionId>,
    /// Charged amount in dollars.
    pub amount: Decimal,
    pub status: PurchaseStatus,
    /// Gateway payment intent id; unique across purchases.
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// Platform share of the amount.
    #[must_use]
    pub fn platform_fee(&self) -> Decimal {
        platform_fee(self.amount)
    }

    /// Amount less the platform share.
    #[must_use]
    pub fn seller_amount(&self) -> Decimal {
        self.amount - self.platform_fee()
    }
}

/// A purchase about to be inserted.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub card_id: CardId,
    pub seller_id: UserId,
    pub buyer: Buyer,
    pub delivery_option_id: Option<DeliveryOptionId>,
    pub amount: Decimal,
    pub status: PurchaseStatus,
    pub payment_intent_id: String,
}

/// JSON projection of a purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub id: PurchaseId,
    pub card_id: CardId,
    pub seller_id: UserId,
    /// `null` for guest checkouts.
    pub buyer_id: Option<UserId>,
    pub delivery_option_id: Option<DeliveryOptionId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub seller_amount: Decimal,
    pub status: PurchaseStatus,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            platform_fee: purchase.platform_fee(),
            seller_amount: purchase.seller_amount(),
            id: purchase.id,
            card_id: purchase.card_id,
            seller_id: purchase.seller_id,
            buyer_id: purchase.buyer.user_id(),
            delivery_option_id: purchase.delivery_option_id,
            amount: purchase.amount,
            status: purchase.status,
            payment_intent_id: purchase.payment_intent_id,
            created_at: purchase.created_at,
        }
    }
}

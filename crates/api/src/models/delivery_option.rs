//! Seller shipping choices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rinkside_core::price::format_usd;
use rinkside_core::{DeliveryOptionId, UserId};

use super::validation::{ValidationErrors, check_money, check_text, normalize};

/// A shipping choice offered by one seller.
#[derive(Debug, Clone)]
pub struct DeliveryOption {
    pub id: DeliveryOptionId,
    pub seller_id: UserId,
    /// Unique per seller.
    pub name: String,
    /// Free-text delivery estimate, e.g. `3-5 business days`.
    pub duration: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated delivery option attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptionFields {
    pub name: String,
    pub duration: String,
    pub price: Decimal,
}

/// Request body (`{"delivery_option": {...}}`). Absent keys keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct DeliveryOptionInput {
    pub name: Option<String>,
    pub duration: Option<String>,
    pub price: Option<Decimal>,
}

impl DeliveryOptionInput {
    /// Merge over `current` (if updating) and validate.
    ///
    /// # Errors
    ///
    /// Returns every failed rule as a full message.
    pub fn validate(
        self,
        current: Option<&DeliveryOption>,
    ) -> Result<DeliveryOptionFields, ValidationErrors> {
        let name = normalize(self.name.or_else(|| current.map(|c| c.name.clone())));
        let duration = normalize(self.duration.or_else(|| current.map(|c| c.duration.clone())));
        let price = self.price.or_else(|| current.map(|c| c.price));

        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "name", name.as_deref(), 1, 100);
        check_text(&mut errors, "duration", duration.as_deref(), 1, 50);
        if price.is_none() {
            errors.add("price", "can't be blank");
        }
        check_money(&mut errors, "price", price);

        match (name, duration, price) {
            (Some(name), Some(duration), Some(price)) => errors.into_result(DeliveryOptionFields {
                name,
                duration,
                price,
            }),
            _ => Err(errors),
        }
    }
}

/// JSON projection of a delivery option.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOptionResponse {
    pub id: DeliveryOptionId,
    pub name: String,
    pub duration: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub formatted_price: String,
    pub seller_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeliveryOption> for DeliveryOptionResponse {
    fn from(option: DeliveryOption) -> Self {
        Self {
            id: option.id,
            formatted_price: format_usd(option.price),
            name: option.name,
            duration: option.duration,
            price: option.price,
            seller_id: option.seller_id,
            created_at: option.created_at,
            updated_at: option.updated_at,
        }
    }
}

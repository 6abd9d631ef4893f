//! Dollar amounts, cent conversions, and the marketplace fee split.
//!
//! Prices are stored and serialized as [`Decimal`] dollars. The payment
//! gateway works in integer cents, so every conversion between the two goes
//! through this module.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Percentage of the listing price retained by the marketplace.
pub const PLATFORM_FEE_PERCENT: i64 = 5;

/// Errors converting a dollar amount to cents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit in an `i64` number of cents.
    #[error("amount is too large")]
    Overflow,
}

/// Convert a dollar amount to whole cents, truncating fractions of a cent.
///
/// # Errors
///
/// Returns `PriceError::Negative` for negative amounts and
/// `PriceError::Overflow` if the result does not fit in an `i64`.
pub fn to_cents(amount: Decimal) -> Result<i64, PriceError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PriceError::Negative);
    }
    (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or(PriceError::Overflow)
}

/// Convert whole cents to a two-decimal dollar amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format a dollar amount for display (e.g. `$75.00`).
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// The platform's share of a completed purchase amount, rounded to cents.
#[must_use]
pub fn platform_fee(amount: Decimal) -> Decimal {
    (amount * Decimal::from(PLATFORM_FEE_PERCENT) / Decimal::ONE_HUNDRED).round_dp(2)
}

/// How a charge is divided between the platform and the seller.
///
/// The fee is a fixed percentage of the listing price, not of the charged
/// amount: delivery and processor surcharges added by the buyer flow to the
/// seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSplit {
    /// Total charged to the buyer, in cents.
    pub amount_cents: i64,
    /// Platform fee, in cents.
    pub platform_fee_cents: i64,
    /// Amount the seller receives, in cents.
    pub seller_amount_cents: i64,
}

impl FeeSplit {
    /// Compute the split for a charge against a listing price (both in cents).
    #[must_use]
    pub const fn new(amount_cents: i64, listing_price_cents: i64) -> Self {
        let platform_fee_cents = listing_price_cents * PLATFORM_FEE_PERCENT / 100;
        Self {
            amount_cents,
            platform_fee_cents,
            seller_amount_cents: amount_cents - platform_fee_cents,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(dec("75.00")).unwrap(), 7500);
        assert_eq!(to_cents(dec("0")).unwrap(), 0);
        assert_eq!(to_cents(dec("19.999")).unwrap(), 1999);
    }

    #[test]
    fn test_to_cents_negative() {
        assert_eq!(to_cents(dec("-1.00")), Err(PriceError::Negative));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(from_cents(7875), dec("78.75"));
        assert_eq!(from_cents(5), dec("0.05"));
        assert_eq!(from_cents(0), Decimal::ZERO);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec("5")), "$5.00");
        assert_eq!(format_usd(dec("1234.5")), "$1234.50");
    }

    #[test]
    fn test_platform_fee() {
        assert_eq!(platform_fee(dec("75.00")), dec("3.75"));
        assert_eq!(platform_fee(dec("78.75")), dec("3.94"));
    }

    #[test]
    fn test_fee_split_uses_listing_price() {
        let split = FeeSplit::new(7875, 7500);
        assert_eq!(split.platform_fee_cents, 375);
        assert_eq!(split.seller_amount_cents, 7500);
    }

    #[test]
    fn test_fee_split_truncates_fractional_cents() {
        // 5% of 1999 is 99.95
        let split = FeeSplit::new(1999, 1999);
        assert_eq!(split.platform_fee_cents, 99);
        assert_eq!(split.seller_amount_cents, 1900);
    }
}

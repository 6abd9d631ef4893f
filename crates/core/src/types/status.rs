//! Enumerations for card attributes and purchase lifecycle.
//!
//! All of these are stored as `TEXT` columns and parsed back through
//! [`std::str::FromStr`], so the wire spelling and the database spelling are
//! the same string.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `ALL`, `Display`, and `FromStr` for a unit enum with
/// fixed spellings.
macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical spelling used on the wire and in the database.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $what, ": {}"), s)),
                }
            }
        }
    };
}

/// Physical condition of an ungraded (or graded) card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardCondition {
    Mint,
    #[serde(rename = "Near Mint")]
    NearMint,
    Excellent,
    Good,
    Fair,
    Poor,
}

string_enum!(CardCondition, "condition", {
    Mint => "Mint",
    NearMint => "Near Mint",
    Excellent => "Excellent",
    Good => "Good",
    Fair => "Fair",
    Poor => "Poor",
});

/// Rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Ultra Rare")]
    UltraRare,
    Legendary,
}

string_enum!(Rarity, "rarity", {
    Common => "Common",
    Uncommon => "Uncommon",
    Rare => "Rare",
    UltraRare => "Ultra Rare",
    Legendary => "Legendary",
});

/// Third-party grading services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradingCompany {
    Psa,
    Bgs,
    Sgc,
    Ksa,
    Csg,
}

string_enum!(GradingCompany, "grading company", {
    Psa => "PSA",
    Bgs => "BGS",
    Sgc => "SGC",
    Ksa => "KSA",
    Csg => "CSG",
});

/// Purchase record status.
///
/// Purchases are written once by the payment orchestrator; `Completed` is the
/// normal outcome, `Refunded` marks a payment returned because the card was
/// already sold, and `Pending` flags a refund that still needs manual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

string_enum!(PurchaseStatus, "purchase status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

/// Seller payout account state, as reported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAccountStatus {
    /// No connected account linked.
    NotConnected,
    /// Linked, but the gateway has not enabled charges yet.
    Pending,
    /// Linked and able to accept charges.
    Active,
}

impl PaymentAccountStatus {
    /// Map the gateway's `charges_enabled` capability flag.
    #[must_use]
    pub const fn from_charges_enabled(charges_enabled: bool) -> Self {
        if charges_enabled {
            Self::Active
        } else {
            Self::Pending
        }
    }
}

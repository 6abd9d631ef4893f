//! The party that paid for a purchase.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Who paid for a purchase: a registered user or an anonymous guest.
///
/// Persisted as a nullable `buyer_id` column (`NULL` meaning guest) and
/// carried through payment metadata as either the user id or the literal
/// `guest`. [`Buyer::from_metadata`] and [`Buyer::user_id`] are the only
/// places those encodings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Buyer {
    /// A signed-in marketplace user.
    Registered(UserId),
    /// A checkout without an account.
    Guest,
}

impl Buyer {
    /// Metadata value used for guest checkouts.
    pub const GUEST_MARKER: &'static str = "guest";

    /// Build a buyer from an optional authenticated user.
    #[must_use]
    pub const fn from_user(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(id) => Self::Registered(id),
            None => Self::Guest,
        }
    }

    /// Decode a buyer from a payment metadata value.
    ///
    /// Anything that is not a valid user id is treated as a guest, so a
    /// tampered or missing value never attributes a purchase to someone else.
    #[must_use]
    pub fn from_metadata(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse::<UserId>().ok())
            .map_or(Self::Guest, Self::Registered)
    }

    /// The registered user id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Registered(id) => Some(*id),
            Self::Guest => None,
        }
    }
}

impl fmt::Display for Buyer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(id) => write!(f, "{id}"),
            Self::Guest => f.write_str(Self::GUEST_MARKER),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_encoding() {
        let buyer = Buyer::Registered(UserId::new(12));
        assert_eq!(buyer.to_string(), "12");
        assert_eq!(Buyer::Guest.to_string(), "guest");
    }

    #[test]
    fn test_from_metadata() {
        assert_eq!(
            Buyer::from_metadata(Some("12")),
            Buyer::Registered(UserId::new(12))
        );
        assert_eq!(Buyer::from_metadata(Some("guest")), Buyer::Guest);
        assert_eq!(Buyer::from_metadata(Some("12abc")), Buyer::Guest);
        assert_eq!(Buyer::from_metadata(None), Buyer::Guest);
    }

    #[test]
    fn test_user_id() {
        assert_eq!(Buyer::from_user(Some(UserId::new(3))).user_id(), Some(UserId::new(3)));
        assert_eq!(Buyer::from_user(None).user_id(), None);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Buyer::Registered(UserId::new(4))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "registered", "user_id": 4}));

        let json = serde_json::to_value(Buyer::Guest).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "guest"}));
    }
}

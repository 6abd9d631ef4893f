//! Single-row site preference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner name written by `initialize` when the row does not exist yet.
pub const DEFAULT_OWNER_NAME: &str = "Ryan";
/// Favorite number written by `initialize` when the row does not exist yet.
pub const DEFAULT_FAVORITE_NUMBER: i32 = 4;

/// The site preference row.
#[derive(Debug, Clone)]
pub struct SitePreference {
    pub owner_name: String,
    pub favorite_number: i32,
    pub updated_at: DateTime<Utc>,
}

/// `POST /preferences/favorite_number` body.
#[derive(Debug, Deserialize)]
pub struct FavoriteNumberInput {
    pub favorite_number: Option<NumberOrText>,
}

/// A number sent either as JSON number or as a numeric string (`"7"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl FavoriteNumberInput {
    /// The requested number, if it is a positive `i32`.
    #[must_use]
    pub fn positive(&self) -> Option<i32> {
        self.favorite_number
            .as_ref()
            .and_then(NumberOrText::as_i64)
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
    }
}

/// Response for both the read and the update.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteNumberResponse {
    pub favorite_number: i32,
    pub message: String,
    pub last_updated: DateTime<Utc>,
}

impl FavoriteNumberResponse {
    /// `Ryan's favorite number is 4!`
    #[must_use]
    pub fn current(pref: &SitePreference) -> Self {
        Self {
            favorite_number: pref.favorite_number,
            message: format!(
                "{}'s favorite number is {}!",
                pref.owner_name, pref.favorite_number
            ),
            last_updated: pref.updated_at,
        }
    }

    /// `Updated Ryan's favorite number to 7!`
    #[must_use]
    pub fn updated(pref: &SitePreference) -> Self {
        Self {
            favorite_number: pref.favorite_number,
            message: format!(
                "Updated {}'s favorite number to {}!",
                pref.owner_name, pref.favorite_number
            ),
            last_updated: pref.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive() {
        let valid: FavoriteNumberInput = serde_json::from_str(r#"{"favorite_number": 7}"#).unwrap();
        assert_eq!(valid.positive(), Some(7));

        let text: FavoriteNumberInput =
            serde_json::from_str(r#"{"favorite_number": " 12 "}"#).unwrap();
        assert_eq!(text.positive(), Some(12));

        for body in [
            r#"{"favorite_number": 0}"#,
            r#"{"favorite_number": -2}"#,
            r#"{"favorite_number": 99999999999}"#,
            r#"{"favorite_number": "seven"}"#,
            r#"{"favorite_number": ""}"#,
            r#"{"favorite_number": null}"#,
            "{}",
        ] {
            let input: FavoriteNumberInput = serde_json::from_str(body).unwrap();
            assert_eq!(input.positive(), None, "{body}");
        }
    }

    #[test]
    fn test_messages() {
        let pref = SitePreference {
            owner_name: DEFAULT_OWNER_NAME.to_string(),
            favorite_number: DEFAULT_FAVORITE_NUMBER,
            updated_at: Utc::now(),
        };
        assert_eq!(
            FavoriteNumberResponse::current(&pref).message,
            "Ryan's favorite number is 4!"
        );
        assert_eq!(
            FavoriteNumberResponse::updated(&pref).message,
            "Updated Ryan's favorite number to 4!"
        );
    }
}

//! Field validation helpers shared by the request models.
//!
//! Messages are full sentences built from the attribute name, e.g.
//! `Player name can't be blank`, and are returned to clients verbatim in the
//! `details` array of a 422 response.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Exclusive upper bound on money amounts (`NUMERIC(12,2)` columns), 10^10.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Decimal places kept by money columns.
pub const MONEY_SCALE: u32 = 2;

/// An itemized list of validation failures.
#[derive(Debug, Default, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", .0.join(", "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    /// Create an empty error list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an error list with a single message for `field`.
    #[must_use]
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` against `field` (a `snake_case` attribute name).
    pub fn add(&mut self, field: &str, message: &str) {
        self.0.push(format!("{} {message}", humanize(field)));
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Consume the list, returning the messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    /// `Ok(value)` if nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the accumulated errors if any were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Turn `front_image_url` into `Front image url`.
fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Trim a string, mapping blank values to `None`.
#[must_use]
pub fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_owned())
        }
    })
}

/// Whether `value` parses as an absolute `http` or `https` URL with a host.
#[must_use]
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

/// Check a required text field's presence and length bounds.
pub fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) {
    let Some(value) = value else {
        errors.add(field, "can't be blank");
        return;
    };

    let len = value.chars().count();
    if len < min {
        errors.add(
            field,
            &format!("is too short (minimum is {min} characters)"),
        );
    } else if len > max {
        errors.add(field, &format!("is too long (maximum is {max} characters)"));
    }
}

/// Check an optional money amount against the column's range and precision.
pub fn check_money(errors: &mut ValidationErrors, field: &str, value: Option<Decimal>) {
    let Some(value) = value else { return };

    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "must be greater than or equal to 0");
    } else if value >= MONEY_LIMIT {
        errors.add(field, &format!("must be less than {MONEY_LIMIT}"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        errors.add(
            field,
            &format!("must have at most {MONEY_SCALE} decimal places"),
        );
    }
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)`, and a value becomes `Some(Some(value))`.
///
/// # Errors
///
/// Returns the inner type's deserialization error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Like [`nullable`], but also accepts integers sent as JSON strings
/// (`"2023"`), which HTML form clients commonly do.
///
/// # Errors
///
/// Returns an error if a string value is not a valid integer.
pub fn nullable_lenient_i32<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i32),
        Str(String),
    }

    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(Some(None)),
        Some(IntOrString::Int(n)) => Ok(Some(Some(n))),
        Some(IntOrString::Str(s)) if s.trim().is_empty() => Ok(Some(None)),
        Some(IntOrString::Str(s)) => s
            .trim()
            .parse::<i32>()
            .map(|n| Some(Some(n)))
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{s}'"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        team: Option<Option<String>>,
        #[serde(default, deserialize_with = "nullable_lenient_i32")]
        year: Option<Option<i32>>,
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("front_image_url"), "Front image url");
        assert_eq!(humanize("year"), "Year");
    }

    #[test]
    fn test_add_builds_full_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("player_name", "can't be blank");
        errors.add("year", "must be greater than 1900");
        assert_eq!(
            errors.messages(),
            ["Player name can't be blank", "Year must be greater than 1900"]
        );
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Some("  Oilers ".to_string())), Some("Oilers".to_string()));
        assert_eq!(normalize(Some("   ".to_string())), None);
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://x/y.jpg"));
        assert!(is_http_url("http://res.cloudinary.com/demo/image/upload/card.png"));
        assert!(!is_http_url("ftp://x/y.jpg"));
        assert!(!is_http_url("not a url"));
        assert!(!is_http_url("/relative/path.jpg"));
    }

    #[test]
    fn test_check_text() {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "player_name", None, 2, 100);
        check_text(&mut errors, "player_name", Some("A"), 2, 100);
        check_text(&mut errors, "player_name", Some(&"x".repeat(101)), 2, 100);
        check_text(&mut errors, "player_name", Some("Connor McDavid"), 2, 100);
        assert_eq!(
            errors.messages(),
            [
                "Player name can't be blank",
                "Player name is too short (minimum is 2 characters)",
                "Player name is too long (maximum is 100 characters)",
            ]
        );
    }

    #[test]
    fn test_check_money() {
        let mut errors = ValidationErrors::new();
        check_money(&mut errors, "price", None);
        check_money(&mut errors, "price", Some(Decimal::ZERO));
        check_money(&mut errors, "price", Some(Decimal::new(999_999_999_999, 2)));
        check_money(&mut errors, "price", Some(Decimal::new(7_500, 3)));
        assert!(errors.is_empty());

        check_money(&mut errors, "price", Some(Decimal::new(-1, 0)));
        check_money(&mut errors, "price", Some(Decimal::new(10_000_000_000, 0)));
        check_money(&mut errors, "price", Some(Decimal::new(1_999, 3)));
        assert_eq!(
            errors.messages(),
            [
                "Price must be greater than or equal to 0",
                "Price must be less than 10000000000",
                "Price must have at most 2 decimal places",
            ]
        );
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.team, None);

        let null: Patch = serde_json::from_str(r#"{"team": null}"#).unwrap();
        assert_eq!(null.team, Some(None));

        let value: Patch = serde_json::from_str(r#"{"team": "Oilers"}"#).unwrap();
        assert_eq!(value.team, Some(Some("Oilers".to_string())));
    }

    #[test]
    fn test_nullable_lenient_i32() {
        let number: Patch = serde_json::from_str(r#"{"year": 2023}"#).unwrap();
        assert_eq!(number.year, Some(Some(2023)));

        let string: Patch = serde_json::from_str(r#"{"year": " 2023 "}"#).unwrap();
        assert_eq!(string.year, Some(Some(2023)));

        let blank: Patch = serde_json::from_str(r#"{"year": ""}"#).unwrap();
        assert_eq!(blank.year, Some(None));

        assert!(serde_json::from_str::<Patch>(r#"{"year": "soon"}"#).is_err());
    }
}

//! Card listing query parameters: filters, sort order, and pagination.
//!
//! Query strings arrive as loose strings and are normalized here, so the
//! repository only ever sees well-formed values.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rinkside_core::UserId;

/// Default page size.
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: i64 = 50;
/// Maximum number of search results.
pub const SEARCH_LIMIT: i64 = 50;

/// Raw query string for the card listing endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CardQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub player: Option<String>,
    pub team: Option<String>,
    pub year: Option<String>,
    pub manufacturer: Option<String>,
    pub set: Option<String>,
    pub rookie: Option<String>,
    pub autographed: Option<String>,
    pub graded: Option<String>,
    pub grading_company: Option<String>,
    pub condition: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub rarity: Option<String>,
    pub for_sale: Option<String>,
}

/// Conjunctive card predicates. `None`/`false` means "do not narrow".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CardFilter {
    /// Case-insensitive substring of player name.
    pub player: Option<String>,
    /// Case-insensitive substring of team.
    pub team: Option<String>,
    /// Case-insensitive substring of set name.
    pub set_name: Option<String>,
    pub year: Option<i32>,
    pub manufacturer: Option<String>,
    pub condition: Option<String>,
    pub rarity: Option<String>,
    pub grading_company: Option<String>,
    pub rookie: bool,
    pub autographed: bool,
    pub graded: bool,
    pub for_sale: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub owner_id: Option<UserId>,
    /// Free text matched against player, team, manufacturer, or set name.
    pub search: Option<String>,
}

/// Result ordering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CardSort {
    PriceAsc,
    PriceDesc,
    YearAsc,
    YearDesc,
    PlayerName,
    Popular,
    #[default]
    Recent,
}

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Only the literal `true` narrows a flag filter.
fn flag(value: Option<&String>) -> bool {
    value.is_some_and(|v| v == "true")
}

impl CardQuery {
    /// Build the predicate set from the query string.
    ///
    /// Unparsable numbers are ignored rather than rejected, except `year`,
    /// which then matches nothing.
    #[must_use]
    pub fn filter(&self) -> CardFilter {
        CardFilter {
            player: present(self.player.as_ref()),
            team: present(self.team.as_ref()),
            set_name: present(self.set.as_ref()),
            year: present(self.year.as_ref()).map(|y| y.parse().unwrap_or(0)),
            manufacturer: present(self.manufacturer.as_ref()),
            condition: present(self.condition.as_ref()),
            rarity: present(self.rarity.as_ref()),
            grading_company: present(self.grading_company.as_ref()),
            rookie: flag(self.rookie.as_ref()),
            autographed: flag(self.autographed.as_ref()),
            graded: flag(self.graded.as_ref()),
            for_sale: flag(self.for_sale.as_ref()),
            min_price: present(self.min_price.as_ref()).and_then(|p| Decimal::from_str(&p).ok()),
            max_price: present(self.max_price.as_ref()).and_then(|p| Decimal::from_str(&p).ok()),
            owner_id: None,
            search: None,
        }
    }

    /// The requested sort order (`recent` when absent or unknown).
    #[must_use]
    pub fn sort(&self) -> CardSort {
        self.sort.as_deref().map(CardSort::parse).unwrap_or_default()
    }

    /// The requested page, normalized.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page.as_deref(), self.per_page.as_deref())
    }

    /// The trimmed search text, if not blank.
    #[must_use]
    pub fn search_text(&self) -> Option<String> {
        present(self.q.as_ref())
    }
}

impl CardSort {
    /// Parse a sort key, falling back to [`CardSort::Recent`].
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "year_asc" => Self::YearAsc,
            "year_desc" => Self::YearDesc,
            "player_name" => Self::PlayerName,
            "popular" => Self::Popular,
            _ => Self::Recent,
        }
    }

    /// `ORDER BY` clause body. The trailing id keeps pages stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::PriceAsc => "asking_price ASC NULLS LAST, id ASC",
            Self::PriceDesc => "asking_price DESC NULLS LAST, id DESC",
            Self::YearAsc => "year ASC, id ASC",
            Self::YearDesc => "year DESC, id DESC",
            Self::PlayerName => "player_name ASC, id ASC",
            Self::Popular => "card_popularity DESC, id DESC",
            Self::Recent => "created_at DESC, id DESC",
        }
    }
}

impl Pagination {
    /// Normalize raw `page` and `per_page` values.
    ///
    /// Page below 1 (or unparsable) becomes 1. Page size above the maximum is
    /// capped; zero, negative, or unparsable sizes use the default.
    #[must_use]
    pub fn new(page: Option<&str>, per_page: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let per_page = per_page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map(|p| p.min(MAX_PER_PAGE))
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PER_PAGE);
        Self { page, per_page }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Build the response metadata for `total_count` matching rows.
    #[must_use]
    pub const fn meta(&self, total_count: i64) -> PaginationMeta {
        PaginationMeta {
            current_page: self.page,
            per_page: self.per_page,
            total_pages: (total_count + self.per_page - 1) / self.per_page,
            total_count,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Escape `LIKE` metacharacters and wrap the text in `%...%`.
#[must_use]
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> CardQuery {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_pagination_defaults_and_caps() {
        assert_eq!(Pagination::new(None, None), Pagination::default());
        assert_eq!(Pagination::new(Some("0"), Some("0")).page, 1);
        assert_eq!(Pagination::new(None, Some("0")).per_page, 20);
        assert_eq!(Pagination::new(None, Some("-5")).per_page, 20);
        assert_eq!(Pagination::new(None, Some("500")).per_page, 50);
        assert_eq!(Pagination::new(None, Some("abc")).per_page, 20);
        assert_eq!(Pagination::new(Some("-3"), None).page, 1);
        assert_eq!(Pagination::new(Some("3"), Some("10")).offset(), 20);
    }

    #[test]
    fn test_pagination_meta() {
        let page = Pagination::new(Some("2"), Some("20"));
        let meta = page.meta(41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 2);
        assert_eq!(page.meta(0).total_pages, 0);
        assert_eq!(page.meta(40).total_pages, 2);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(CardSort::parse("price_asc"), CardSort::PriceAsc);
        assert_eq!(CardSort::parse("popular"), CardSort::Popular);
        assert_eq!(CardSort::parse("bogus"), CardSort::Recent);
        assert_eq!(CardQuery::default().sort(), CardSort::Recent);
    }

    #[test]
    fn test_flags_only_narrow_on_literal_true() {
        let filter = query(&[("rookie", "true"), ("graded", "1"), ("for_sale", "false")]).filter();
        assert!(filter.rookie);
        assert!(!filter.graded);
        assert!(!filter.for_sale);
    }

    #[test]
    fn test_filter_values() {
        let filter = query(&[
            ("player", " McDavid "),
            ("set", "Series 1"),
            ("year", "2023"),
            ("min_price", "10"),
            ("max_price", "cheap"),
            ("team", ""),
        ])
        .filter();
        assert_eq!(filter.player.as_deref(), Some("McDavid"));
        assert_eq!(filter.set_name.as_deref(), Some("Series 1"));
        assert_eq!(filter.year, Some(2023));
        assert_eq!(filter.min_price, Some(Decimal::from(10)));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.team, None);

        assert_eq!(query(&[("year", "soon")]).filter().year, Some(0));
    }

    #[test]
    fn test_search_text() {
        assert_eq!(query(&[("q", "   ")]).search_text(), None);
        assert_eq!(query(&[("q", "mcdavid")]).search_text().as_deref(), Some("mcdavid"));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("McDavid"), "%McDavid%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}

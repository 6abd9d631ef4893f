//! Card listing types.
//!
//! A card moves through three shapes:
//!
//! - [`CardInput`] - the JSON patch a client sends (absent keys are left alone,
//!   explicit `null` clears a nullable field)
//! - [`CardDraft`] - the merged, unvalidated attribute set
//! - [`CardFields`] - the validated attribute set that is persisted
//!
//! [`CardResponse`] is the JSON projection returned by every card endpoint.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rinkside_core::price::format_usd;
use rinkside_core::{CardCondition, CardId, GradingCompany, Rarity, UserId};

use super::user::UserProfile;
use super::validation::{
    ValidationErrors, check_money, check_text, is_http_url, normalize, nullable,
    nullable_lenient_i32,
};

/// Card size assumed when none is given.
pub const DEFAULT_CARD_SIZE: &str = "Standard";

/// Asking prices below this fraction of the purchase price are rejected.
const MIN_ASKING_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Grading company and grade, present together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub company: GradingCompany,
    pub grade: String,
}

/// Validated card attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CardFields {
    pub player_name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub jersey_number: Option<i32>,

    pub manufacturer: String,
    pub set_name: String,
    pub card_number: String,
    pub year: i32,
    pub series: Option<String>,

    pub parallel_variant: Option<String>,
    pub serial_number: Option<String>,
    pub rookie_card: bool,
    pub autographed: bool,
    pub memorabilia: bool,
    pub memorabilia_type: Option<String>,
    pub short_print: bool,

    pub condition: CardCondition,
    /// `Some` exactly when the card is graded.
    pub grading: Option<Grading>,
    pub grade_details: Map<String, Value>,
    pub rarity: Option<Rarity>,

    pub estimated_value: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub last_sold_price: Option<Decimal>,

    pub card_size: String,
    pub card_stock: Option<String>,
    pub foil_treatment: Option<String>,

    pub front_image_url: String,
    pub back_image_url: Option<String>,
    pub detail_image_urls: Vec<String>,

    pub for_sale: bool,
    pub asking_price: Option<Decimal>,
    pub price_negotiable: bool,
    pub trade_only: bool,

    pub acquired_date: Option<NaiveDate>,
    pub acquired_from: Option<String>,
    pub pack_details: Option<String>,

    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl CardFields {
    /// Whether the card carries a grading company and grade.
    #[must_use]
    pub const fn graded(&self) -> bool {
        self.grading.is_some()
    }

    /// `Connor McDavid (Edmonton Oilers) 2023`
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.team {
            Some(team) => format!("{} ({team}) {}", self.player_name, self.year),
            None => format!("{} {}", self.player_name, self.year),
        }
    }

    /// `2023 Upper Deck Series 1 #1 Connor McDavid`
    #[must_use]
    pub fn full_card_name(&self) -> String {
        format!(
            "{} {} {} #{} {}",
            self.year, self.manufacturer, self.set_name, self.card_number, self.player_name
        )
    }

    /// `PSA 10` for graded cards, otherwise the raw condition.
    #[must_use]
    pub fn condition_grade_display(&self) -> String {
        self.grading.as_ref().map_or_else(
            || self.condition.to_string(),
            |g| format!("{} {}", g.company, g.grade),
        )
    }

    /// The `n/m` halves of a numbered serial.
    fn serial_parts(&self) -> Option<(&str, &str)> {
        self.serial_number.as_deref()?.split_once('/')
    }

    /// Whether the serial number has the `n/m` form.
    #[must_use]
    pub fn is_numbered(&self) -> bool {
        self.serial_parts().is_some()
    }

    /// `m` from an `n/m` serial.
    #[must_use]
    pub fn print_run(&self) -> Option<i32> {
        self.serial_parts()
            .and_then(|(_, run)| run.trim().parse().ok())
    }

    /// `n` from an `n/m` serial.
    #[must_use]
    pub fn card_serial(&self) -> Option<i32> {
        self.serial_parts()
            .and_then(|(serial, _)| serial.trim().parse().ok())
    }

    /// Flip the sale state.
    ///
    /// Listing uses `asking_price` when given, else the stored price.
    /// Delisting clears the price. Only the sale fields are checked.
    ///
    /// # Errors
    ///
    /// Returns the failed asking price rules; `self` is left unchanged.
    pub fn toggle_sale(&mut self, asking_price: Option<Decimal>) -> Result<(), ValidationErrors> {
        let for_sale = !self.for_sale;
        let asking_price = if for_sale {
            asking_price.or(self.asking_price)
        } else {
            None
        };

        let mut errors = ValidationErrors::new();
        check_money(&mut errors, "asking_price", asking_price);
        check_listing(&mut errors, for_sale, asking_price, self.purchase_price);
        errors.into_result(())?;

        self.for_sale = for_sale;
        self.asking_price = asking_price;
        Ok(())
    }

    /// `$120.00`, or `N/A` without an estimate.
    #[must_use]
    pub fn estimated_value_formatted(&self) -> String {
        self.estimated_value
            .map_or_else(|| "N/A".to_owned(), format_usd)
    }
}

/// A persisted card listing.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub owner_id: UserId,
    pub fields: CardFields,
    /// Number of detail views.
    pub card_popularity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Merged card attributes prior to validation.
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub player_name: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub jersey_number: Option<i32>,
    pub manufacturer: Option<String>,
    pub set_name: Option<String>,
    pub card_number: Option<String>,
    pub year: Option<i32>,
    pub series: Option<String>,
    pub parallel_variant: Option<String>,
    pub serial_number: Option<String>,
    pub rookie_card: bool,
    pub autographed: bool,
    pub memorabilia: bool,
    pub memorabilia_type: Option<String>,
    pub short_print: bool,
    pub condition: Option<String>,
    pub graded: bool,
    pub grading_company: Option<String>,
    pub grade: Option<String>,
    pub grade_details: Map<String, Value>,
    pub rarity: Option<String>,
    pub estimated_value: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub last_sold_price: Option<Decimal>,
    pub card_size: Option<String>,
    pub card_stock: Option<String>,
    pub foil_treatment: Option<String>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    pub detail_image_urls: Vec<String>,
    pub for_sale: bool,
    pub asking_price: Option<Decimal>,
    pub price_negotiable: bool,
    pub trade_only: bool,
    pub acquired_date: Option<NaiveDate>,
    pub acquired_from: Option<String>,
    pub pack_details: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// A create or update request body (`{"card": {...}}`).
///
/// Every field is optional. Nullable fields use `Option<Option<T>>` so that an
/// explicit `null` can be told apart from a missing key.
#[derive(Debug, Default, Deserialize)]
pub struct CardInput {
    #[serde(default, deserialize_with = "nullable")]
    pub player_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub team: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_lenient_i32")]
    pub jersey_number: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub manufacturer: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub set_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub card_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_lenient_i32")]
    pub year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub series: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parallel_variant: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub serial_number: Option<Option<String>>,
    pub rookie_card: Option<bool>,
    pub autographed: Option<bool>,
    pub memorabilia: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub memorabilia_type: Option<Option<String>>,
    pub short_print: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub condition: Option<Option<String>>,
    pub graded: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub grading_company: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub grade: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub grade_details: Option<Option<Map<String, Value>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rarity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_value: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub purchase_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_sold_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub card_size: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub card_stock: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub foil_treatment: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub front_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub back_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub detail_image_urls: Option<Option<Vec<String>>>,
    pub for_sale: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub asking_price: Option<Option<Decimal>>,
    pub price_negotiable: Option<bool>,
    pub trade_only: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub acquired_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub acquired_from: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub pack_details: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<String>>>,
}

/// Overwrite each listed draft field whose key was present in the input.
macro_rules! merge {
    ($draft:ident, $input:ident, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $input.$field {
                $draft.$field = value;
            }
        )*
    };
}

impl CardDraft {
    /// A blank draft with the defaults a new listing starts from.
    #[must_use]
    pub fn new() -> Self {
        Self {
            card_size: Some(DEFAULT_CARD_SIZE.to_owned()),
            price_negotiable: true,
            ..Self::default()
        }
    }

    /// Apply a client patch on top of this draft.
    pub fn apply(&mut self, input: CardInput) {
        let draft = self;
        merge!(draft, input, [
            player_name, team, position, jersey_number,
            manufacturer, set_name, card_number, year, series,
            parallel_variant, serial_number, rookie_card, autographed,
            memorabilia, memorabilia_type, short_print,
            condition, graded, grading_company, grade, rarity,
            estimated_value, purchase_price, last_sold_price,
            card_size, card_stock, foil_treatment,
            front_image_url, back_image_url,
            for_sale, asking_price, price_negotiable, trade_only,
            acquired_date, acquired_from, pack_details, description,
        ]);

        if let Some(details) = input.grade_details {
            draft.grade_details = details.unwrap_or_default();
        }
        if let Some(urls) = input.detail_image_urls {
            draft.detail_image_urls = urls.unwrap_or_default();
        }
        if let Some(tags) = input.tags {
            draft.tags = tags.unwrap_or_default();
        }
    }

    /// Validate the merged attributes.
    ///
    /// `current_year` bounds the card year (`1900 < year <= current_year + 1`).
    ///
    /// # Errors
    ///
    /// Returns every failed rule as a full message.
    #[allow(clippy::too_many_lines)]
    pub fn validate(self, current_year: i32) -> Result<CardFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let player_name = normalize(self.player_name);
        check_text(&mut errors, "player_name", player_name.as_deref(), 2, 100);

        let manufacturer = required(&mut errors, "manufacturer", self.manufacturer);
        let set_name = required(&mut errors, "set_name", self.set_name);
        let card_number = required(&mut errors, "card_number", self.card_number);

        let max_year = current_year + 1;
        match self.year {
            None => errors.add("year", "can't be blank"),
            Some(y) if y <= 1900 => errors.add("year", "must be greater than 1900"),
            Some(y) if y > max_year => errors.add(
                "year",
                &format!("must be less than or equal to {max_year}"),
            ),
            Some(_) => {}
        }

        let condition = normalize(self.condition).and_then(|c| c.parse::<CardCondition>().ok());
        if condition.is_none() {
            errors.add("condition", "must be a valid condition");
        }

        let rarity = match normalize(self.rarity) {
            None => None,
            Some(r) => r
                .parse::<Rarity>()
                .inspect_err(|_| errors.add("rarity", "is not included in the list"))
                .ok(),
        };

        let grading_company = normalize(self.grading_company);
        let company = match grading_company.as_deref() {
            None => None,
            Some(c) => c
                .parse::<GradingCompany>()
                .inspect_err(|_| errors.add("grading_company", "is not included in the list"))
                .ok(),
        };
        let grade = normalize(self.grade);
        if self.graded && (grading_company.is_none() || grade.is_none()) {
            errors.add(
                "graded",
                "must have both grading company and grade when marked as graded",
            );
        }
        if !self.graded && (grading_company.is_some() || grade.is_some()) {
            errors.add(
                "graded",
                "should be true when grading company or grade is specified",
            );
        }

        let front_image_url = normalize(self.front_image_url);
        match front_image_url.as_deref() {
            None => errors.add("front_image_url", "can't be blank"),
            Some(url) if !is_http_url(url) => errors.add("front_image_url", "is invalid"),
            Some(_) => {}
        }

        for (field, value) in [
            ("estimated_value", self.estimated_value),
            ("purchase_price", self.purchase_price),
            ("asking_price", self.asking_price),
            ("last_sold_price", self.last_sold_price),
        ] {
            check_money(&mut errors, field, value);
        }

        check_listing(
            &mut errors,
            self.for_sale,
            self.asking_price,
            self.purchase_price,
        );

        let (
            Some(player_name),
            Some(manufacturer),
            Some(set_name),
            Some(card_number),
            Some(year),
            Some(condition),
            Some(front_image_url),
        ) = (
            player_name,
            manufacturer,
            set_name,
            card_number,
            self.year,
            condition,
            front_image_url,
        )
        else {
            return Err(errors);
        };

        let grading = match (self.graded, company, grade) {
            (true, Some(company), Some(grade)) => Some(Grading { company, grade }),
            _ => None,
        };

        errors.into_result(CardFields {
            player_name,
            team: normalize(self.team),
            position: normalize(self.position),
            jersey_number: self.jersey_number,
            manufacturer,
            set_name,
            card_number,
            year,
            series: normalize(self.series),
            parallel_variant: normalize(self.parallel_variant),
            serial_number: normalize(self.serial_number),
            rookie_card: self.rookie_card,
            autographed: self.autographed,
            memorabilia: self.memorabilia,
            memorabilia_type: normalize(self.memorabilia_type),
            short_print: self.short_print,
            condition,
            grading,
            grade_details: self.grade_details,
            rarity,
            estimated_value: self.estimated_value,
            purchase_price: self.purchase_price,
            last_sold_price: self.last_sold_price,
            card_size: normalize(self.card_size).unwrap_or_else(|| DEFAULT_CARD_SIZE.to_owned()),
            card_stock: normalize(self.card_stock),
            foil_treatment: normalize(self.foil_treatment),
            front_image_url,
            back_image_url: normalize(self.back_image_url),
            detail_image_urls: self.detail_image_urls,
            for_sale: self.for_sale,
            asking_price: self.asking_price,
            price_negotiable: self.price_negotiable,
            trade_only: self.trade_only,
            acquired_date: self.acquired_date,
            acquired_from: normalize(self.acquired_from),
            pack_details: normalize(self.pack_details),
            description: normalize(self.description),
            tags: self.tags,
        })
    }
}

/// Rules tying the asking price to the sale flag and purchase price.
fn check_listing(
    errors: &mut ValidationErrors,
    for_sale: bool,
    asking_price: Option<Decimal>,
    purchase_price: Option<Decimal>,
) {
    if for_sale && asking_price.is_none() {
        errors.add("asking_price", "must be specified when card is for sale");
    }
    if let (Some(asking), Some(purchase)) = (asking_price, purchase_price)
        && asking < purchase * MIN_ASKING_RATIO
    {
        errors.add(
            "asking_price",
            "seems unusually low compared to purchase price",
        );
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    let value = normalize(value);
    if value.is_none() {
        errors.add(field, "can't be blank");
    }
    value
}

impl From<CardFields> for CardDraft {
    fn from(fields: CardFields) -> Self {
        let graded = fields.graded();
        let (grading_company, grade) = fields
            .grading
            .map_or((None, None), |g| (Some(g.company.to_string()), Some(g.grade)));

        Self {
            player_name: Some(fields.player_name),
            team: fields.team,
            position: fields.position,
            jersey_number: fields.jersey_number,
            manufacturer: Some(fields.manufacturer),
            set_name: Some(fields.set_name),
            card_number: Some(fields.card_number),
            year: Some(fields.year),
            series: fields.series,
            parallel_variant: fields.parallel_variant,
            serial_number: fields.serial_number,
            rookie_card: fields.rookie_card,
            autographed: fields.autographed,
            memorabilia: fields.memorabilia,
            memorabilia_type: fields.memorabilia_type,
            short_print: fields.short_print,
            condition: Some(fields.condition.to_string()),
            graded,
            grading_company,
            grade,
            grade_details: fields.grade_details,
            rarity: fields.rarity.map(|r| r.to_string()),
            estimated_value: fields.estimated_value,
            purchase_price: fields.purchase_price,
            last_sold_price: fields.last_sold_price,
            card_size: Some(fields.card_size),
            card_stock: fields.card_stock,
            foil_treatment: fields.foil_treatment,
            front_image_url: Some(fields.front_image_url),
            back_image_url: fields.back_image_url,
            detail_image_urls: fields.detail_image_urls,
            for_sale: fields.for_sale,
            asking_price: fields.asking_price,
            price_negotiable: fields.price_negotiable,
            trade_only: fields.trade_only,
            acquired_date: fields.acquired_date,
            acquired_from: fields.acquired_from,
            pack_details: fields.pack_details,
            description: fields.description,
            tags: fields.tags,
        }
    }
}

/// Body of `POST /cards/{id}/toggle_sale`.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleSaleInput {
    pub asking_price: Option<Decimal>,
}

/// JSON projection of a card.
#[derive(Debug, Clone, Serialize)]
pub struct CardResponse {
    pub id: CardId,
    pub owner_id: UserId,
    pub player_name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub jersey_number: Option<i32>,
    pub manufacturer: String,
    pub set_name: String,
    pub card_number: String,
    pub year: i32,
    pub series: Option<String>,
    pub parallel_variant: Option<String>,
    pub serial_number: Option<String>,
    pub rookie_card: bool,
    pub autographed: bool,
    pub memorabilia: bool,
    pub memorabilia_type: Option<String>,
    pub short_print: bool,
    pub condition: CardCondition,
    pub graded: bool,
    pub grading_company: Option<GradingCompany>,
    pub grade: Option<String>,
    pub grade_details: Map<String, Value>,
    pub rarity: Option<Rarity>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub estimated_value: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub purchase_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub last_sold_price: Option<Decimal>,
    pub card_size: String,
    pub card_stock: Option<String>,
    pub foil_treatment: Option<String>,
    pub front_image_url: String,
    pub back_image_url: Option<String>,
    pub front_image_thumbnail_url: String,
    pub front_image_medium_url: String,
    pub front_image_large_url: String,
    pub back_image_thumbnail_url: Option<String>,
    pub detail_image_urls: Vec<String>,
    pub for_sale: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub asking_price: Option<Decimal>,
    pub price_negotiable: bool,
    pub trade_only: bool,
    pub acquired_date: Option<NaiveDate>,
    pub acquired_from: Option<String>,
    pub pack_details: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub card_popularity: i32,
    pub display_name: String,
    pub full_card_name: String,
    pub condition_grade_display: String,
    pub estimated_value_formatted: String,
    pub is_numbered: bool,
    pub print_run: Option<i32>,
    pub card_serial: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserProfile>,
}

impl CardResponse {
    /// Attach the owner's public profile (card detail only).
    #[must_use]
    pub fn with_owner(mut self, owner: UserProfile) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        let f = &card.fields;
        let display_name = f.display_name();
        let full_card_name = f.full_card_name();
        let condition_grade_display = f.condition_grade_display();
        let estimated_value_formatted = f.estimated_value_formatted();
        let is_numbered = f.is_numbered();
        let print_run = f.print_run();
        let card_serial = f.card_serial();
        let graded = f.graded();

        let f = card.fields;
        let (grading_company, grade) = f
            .grading
            .map_or((None, None), |g| (Some(g.company), Some(g.grade)));

        Self {
            id: card.id,
            owner_id: card.owner_id,
            player_name: f.player_name,
            team: f.team,
            position: f.position,
            jersey_number: f.jersey_number,
            manufacturer: f.manufacturer,
            set_name: f.set_name,
            card_number: f.card_number,
            year: f.year,
            series: f.series,
            parallel_variant: f.parallel_variant,
            serial_number: f.serial_number,
            rookie_card: f.rookie_card,
            autographed: f.autographed,
            memorabilia: f.memorabilia,
            memorabilia_type: f.memorabilia_type,
            short_print: f.short_print,
            condition: f.condition,
            graded,
            grading_company,
            grade,
            grade_details: f.grade_details,
            rarity: f.rarity,
            estimated_value: f.estimated_value,
            purchase_price: f.purchase_price,
            last_sold_price: f.last_sold_price,
            card_size: f.card_size,
            card_stock: f.card_stock,
            foil_treatment: f.foil_treatment,
            // Resized variants are not generated; every size points at the original.
            front_image_thumbnail_url: f.front_image_url.clone(),
            front_image_medium_url: f.front_image_url.clone(),
            front_image_large_url: f.front_image_url.clone(),
            front_image_url: f.front_image_url,
            back_image_thumbnail_url: f.back_image_url.clone(),
            back_image_url: f.back_image_url,
            detail_image_urls: f.detail_image_urls,
            for_sale: f.for_sale,
            asking_price: f.asking_price,
            price_negotiable: f.price_negotiable,
            trade_only: f.trade_only,
            acquired_date: f.acquired_date,
            acquired_from: f.acquired_from,
            pack_details: f.pack_details,
            description: f.description,
            tags: f.tags,
            card_popularity: card.card_popularity,
            display_name,
            full_card_name,
            condition_grade_display,
            estimated_value_formatted,
            is_numbered,
            print_run,
            card_serial,
            created_at: card.created_at,
            updated_at: card.updated_at,
            owner: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// The McDavid rookie used throughout the tests.
    pub(crate) fn mcdavid_input() -> CardInput {
        serde_json::from_value(json!({
            "player_name": "Connor McDavid",
            "team": "Edmonton Oilers",
            "manufacturer": "Upper Deck",
            "set_name": "Series 1",
            "card_number": "1",
            "year": 2023,
            "condition": "Mint",
            "front_image_url": "https://x/y.jpg"
        }))
        .unwrap()
    }

    fn build(input: CardInput) -> Result<CardFields, ValidationErrors> {
        let mut draft = CardDraft::new();
        draft.apply(input);
        draft.validate(2026)
    }

    fn patch(fields: CardFields, body: Value) -> Result<CardFields, ValidationErrors> {
        let mut draft = CardDraft::from(fields);
        draft.apply(serde_json::from_value(body).unwrap());
        draft.validate(2026)
    }

    #[test]
    fn test_create_defaults() {
        let card = build(mcdavid_input()).unwrap();
        assert!(!card.for_sale);
        assert!(card.price_negotiable);
        assert!(!card.graded());
        assert_eq!(card.card_size, "Standard");
        assert_eq!(card.asking_price, None);
        assert_eq!(card.display_name(), "Connor McDavid (Edmonton Oilers) 2023");
        assert_eq!(card.full_card_name(), "2023 Upper Deck Series 1 #1 Connor McDavid");
        assert_eq!(card.condition_grade_display(), "Mint");
        assert_eq!(card.estimated_value_formatted(), "N/A");
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = build(CardInput::default()).unwrap_err();
        assert_eq!(
            errors.messages(),
            [
                "Player name can't be blank",
                "Manufacturer can't be blank",
                "Set name can't be blank",
                "Card number can't be blank",
                "Year can't be blank",
                "Condition must be a valid condition",
                "Front image url can't be blank",
            ]
        );
    }

    #[test]
    fn test_year_bounds() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(card.clone(), json!({"year": 1900})).unwrap_err();
        assert_eq!(errors.messages(), ["Year must be greater than 1900"]);

        let errors = patch(card.clone(), json!({"year": 2028})).unwrap_err();
        assert_eq!(errors.messages(), ["Year must be less than or equal to 2027"]);

        assert!(patch(card, json!({"year": "2027"})).is_ok());
    }

    #[test]
    fn test_enumerations() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(
            card.clone(),
            json!({"condition": "Pristine", "rarity": "Mythic"}),
        )
        .unwrap_err();
        assert_eq!(
            errors.messages(),
            [
                "Condition must be a valid condition",
                "Rarity is not included in the list",
            ]
        );

        let updated = patch(card, json!({"condition": "Near Mint", "rarity": "Ultra Rare"})).unwrap();
        assert_eq!(updated.condition, CardCondition::NearMint);
        assert_eq!(updated.rarity, Some(Rarity::UltraRare));
    }

    #[test]
    fn test_graded_requires_company_and_grade() {
        let card = build(mcdavid_input()).unwrap();

        let errors = patch(card.clone(), json!({"graded": true, "grading_company": "PSA"})).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Graded must have both grading company and grade when marked as graded"]
        );

        let errors = patch(card.clone(), json!({"grade": "10"})).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Graded should be true when grading company or grade is specified"]
        );

        let graded = patch(
            card,
            json!({"graded": true, "grading_company": "PSA", "grade": "10"}),
        )
        .unwrap();
        assert!(graded.graded());
        assert_eq!(graded.condition_grade_display(), "PSA 10");
    }

    #[test]
    fn test_ungrading_clears_both_fields() {
        let card = build(mcdavid_input()).unwrap();
        let graded = patch(
            card,
            json!({"graded": true, "grading_company": "BGS", "grade": "9.5"}),
        )
        .unwrap();

        let ungraded = patch(
            graded,
            json!({"graded": false, "grading_company": null, "grade": null}),
        )
        .unwrap();
        assert!(!ungraded.graded());
        assert_eq!(ungraded.grading, None);
    }

    #[test]
    fn test_for_sale_requires_price() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(card.clone(), json!({"for_sale": true})).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Asking price must be specified when card is for sale"]
        );

        let listed = patch(card, json!({"for_sale": true, "asking_price": "75.00"})).unwrap();
        assert_eq!(listed.asking_price, Some(Decimal::new(7500, 2)));
    }

    #[test]
    fn test_asking_price_floor_and_negative_money() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(
            card.clone(),
            json!({"purchase_price": 100, "asking_price": 9.99}),
        )
        .unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Asking price seems unusually low compared to purchase price"]
        );

        assert!(patch(card.clone(), json!({"purchase_price": 100, "asking_price": 10})).is_ok());

        let errors = patch(card, json!({"estimated_value": -1})).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Estimated value must be greater than or equal to 0"]
        );
    }

    #[test]
    fn test_money_fits_the_column() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(
            card.clone(),
            json!({"for_sale": true, "asking_price": "10000000000", "purchase_price": "1.005"}),
        )
        .unwrap_err();
        assert_eq!(
            errors.messages(),
            [
                "Purchase price must have at most 2 decimal places",
                "Asking price must be less than 10000000000",
            ]
        );

        let listed = patch(
            card,
            json!({"for_sale": true, "asking_price": "9999999999.99", "last_sold_price": "12.50"}),
        )
        .unwrap();
        assert_eq!(listed.asking_price, Some(Decimal::new(999_999_999_999, 2)));
    }

    #[test]
    fn test_toggle_sale() {
        let mut card = build(mcdavid_input()).unwrap();
        let errors = card.toggle_sale(None).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Asking price must be specified when card is for sale"]
        );
        assert!(!card.for_sale);

        card.toggle_sale(Some(Decimal::new(75, 0))).unwrap();
        assert!(card.for_sale);
        assert_eq!(card.asking_price, Some(Decimal::new(75, 0)));

        card.toggle_sale(Some(Decimal::new(99, 0))).unwrap();
        assert!(!card.for_sale);
        assert_eq!(card.asking_price, None);
    }

    #[test]
    fn test_toggle_sale_checks_only_the_price() {
        let mut card = build(mcdavid_input()).unwrap();
        // Stored before the year bound moved; still togglable.
        card.year = 2031;
        card.purchase_price = Some(Decimal::new(100, 0));

        let errors = card.toggle_sale(Some(Decimal::new(5, 0))).unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Asking price seems unusually low compared to purchase price"]
        );

        let errors = card.toggle_sale(Some(Decimal::new(150_001, 3))).unwrap_err();
        assert_eq!(errors.messages(), ["Asking price must have at most 2 decimal places"]);

        card.toggle_sale(Some(Decimal::new(150, 0))).unwrap();
        assert!(card.for_sale);
        assert_eq!(card.year, 2031);
    }

    #[test]
    fn test_front_image_must_be_http() {
        let card = build(mcdavid_input()).unwrap();
        let errors = patch(card, json!({"front_image_url": "javascript:alert(1)"})).unwrap_err();
        assert_eq!(errors.messages(), ["Front image url is invalid"]);
    }

    #[test]
    fn test_partial_update_keeps_absent_fields_and_clears_null() {
        let card = build(mcdavid_input()).unwrap();
        let updated = patch(card, json!({"team": null, "series": "Young Guns"})).unwrap();
        assert_eq!(updated.team, None);
        assert_eq!(updated.series.as_deref(), Some("Young Guns"));
        assert_eq!(updated.player_name, "Connor McDavid");
        assert_eq!(updated.display_name(), "Connor McDavid 2023");
    }

    #[test]
    fn test_serial_number_parts() {
        let card = build(mcdavid_input()).unwrap();
        let numbered = patch(card.clone(), json!({"serial_number": "123/999"})).unwrap();
        assert!(numbered.is_numbered());
        assert_eq!(numbered.card_serial(), Some(123));
        assert_eq!(numbered.print_run(), Some(999));

        let plain = patch(card, json!({"serial_number": "SP"})).unwrap();
        assert!(!plain.is_numbered());
        assert_eq!(plain.print_run(), None);
    }

    #[test]
    fn test_response_projection() {
        let mut fields = build(mcdavid_input()).unwrap();
        fields.for_sale = true;
        fields.asking_price = Some(Decimal::new(7500, 2));
        fields.estimated_value = Some(Decimal::new(120, 0));
        let now = Utc::now();
        let card = Card {
            id: CardId::new(9),
            owner_id: UserId::new(1),
            fields,
            card_popularity: 3,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(CardResponse::from(card)).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["asking_price"], 75.0);
        assert_eq!(json["purchase_price"], Value::Null);
        assert_eq!(json["estimated_value_formatted"], "$120.00");
        assert_eq!(json["front_image_thumbnail_url"], "https://x/y.jpg");
        assert_eq!(json["condition"], "Mint");
        assert!(json.get("owner").is_none());
    }
}

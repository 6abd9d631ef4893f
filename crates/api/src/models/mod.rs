//! Domain models for the marketplace API.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`] and shaped for the JSON projections returned to clients.

pub mod card;
pub mod delivery_option;
pub mod preference;
pub mod purchase;
pub mod query;
pub mod user;
pub mod validation;

pub use card::{Card, CardDraft, CardFields, CardInput, CardResponse, Grading, ToggleSaleInput};
pub use delivery_option::{
    DeliveryOption, DeliveryOptionFields, DeliveryOptionInput, DeliveryOptionResponse,
};
pub use preference::{FavoriteNumberInput, FavoriteNumberResponse, SitePreference};
pub use purchase::{NewPurchase, Purchase, PurchaseResponse};
pub use query::{CardFilter, CardQuery, CardSort, Pagination, PaginationMeta};
pub use user::{NewUser, SignupInput, User, UserProfile};
pub use validation::ValidationErrors;

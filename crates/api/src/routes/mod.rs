//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness (also /api/v1/health)
//! GET  /health/ready                            - Readiness (database ping)
//!
//! # Auth
//! POST   /api/v1/auth/signup                    - Register
//! POST   /api/v1/auth/login                     - Sign in
//! GET    /api/v1/auth/me                        - Current user (auth)
//!
//! # Cards
//! GET    /api/v1/cards                          - Filtered, paginated listing
//! POST   /api/v1/cards                          - Create (auth)
//! GET    /api/v1/cards/my_cards                 - Caller's cards (auth)
//! GET    /api/v1/cards/marketplace              - For-sale listing
//! GET    /api/v1/cards/search                   - Free-text search
//! POST   /api/v1/cards/upload_image             - Image upload (multipart)
//! GET    /api/v1/cards/{id}                     - Detail (counts a view)
//! PATCH  /api/v1/cards/{id}                     - Update (owner)
//! DELETE /api/v1/cards/{id}                     - Delete (owner)
//! POST   /api/v1/cards/{id}/toggle_sale         - Flip sale state (owner)
//!
//! # Delivery options
//! GET    /api/v1/delivery_options               - Caller's options (auth)
//! POST   /api/v1/delivery_options               - Create (auth)
//! GET    /api/v1/delivery_options/for_seller/{seller_id} - Seller's options
//! GET    /api/v1/delivery_options/{id}          - Detail (seller)
//! PATCH  /api/v1/delivery_options/{id}          - Update (seller)
//! DELETE /api/v1/delivery_options/{id}          - Delete (seller)
//!
//! # Payments
//! POST   /api/v1/payments/create_intent         - Start checkout
//! POST   /api/v1/payments/webhook               - Stripe events (signed)
//! POST   /api/v1/payments/confirm_payment       - Manual settlement
//! POST   /api/v1/payments/create_connect_account - Seller onboarding (auth)
//! GET    /api/v1/payments/connect_status        - Payout account state (auth)
//! DELETE /api/v1/payments/reset_connect_account - Unlink payout account (auth)
//! GET    /api/v1/payments/purchases             - Purchases and sales (auth)
//!
//! # Preferences
//! GET    /api/v1/preferences/favorite_number
//! POST   /api/v1/preferences/favorite_number
//! ```

pub mod auth;
pub mod cards;
pub mod delivery_options;
pub mod health;
pub mod payments;
pub mod preferences;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

use crate::services::media::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Body limit for image uploads: the image plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the card routes router.
pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cards::index).post(cards::create))
        .route("/my_cards", get(cards::my_cards))
        .route("/marketplace", get(cards::marketplace))
        .route("/search", get(cards::search))
        .route(
            "/upload_image",
            post(cards::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/{id}",
            get(cards::show)
                .patch(cards::update)
                .put(cards::update)
                .delete(cards::destroy),
        )
        .route("/{id}/toggle_sale", post(cards::toggle_sale))
}

/// Create the delivery option routes router.
pub fn delivery_option_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(delivery_options::index).post(delivery_options::create),
        )
        .route(
            "/for_seller/{seller_id}",
            get(delivery_options::for_seller),
        )
        .route(
            "/{id}",
            get(delivery_options::show)
                .patch(delivery_options::update)
                .put(delivery_options::update)
                .delete(delivery_options::destroy),
        )
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create_intent", post(payments::create_intent))
        .route("/webhook", post(payments::webhook))
        .route("/confirm_payment", post(payments::confirm_payment))
        .route(
            "/create_connect_account",
            post(payments::create_connect_account),
        )
        .route(
            "/reset_connect_account",
            delete(payments::reset_connect_account),
        )
        .route("/connect_status", get(payments::connect_status))
        .route("/purchases", get(payments::purchases))
}

/// Create the `/api/v1` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cards", card_routes())
        .nest("/delivery_options", delivery_option_routes())
        .nest("/payments", payment_routes())
        .route(
            "/preferences/favorite_number",
            get(preferences::favorite_number).post(preferences::update_favorite_number),
        )
        .route("/health", get(health::health))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes())
}

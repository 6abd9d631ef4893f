//! End-to-end marketplace flows against `PostgreSQL`.
//!
//! Each test gets a fresh database from `#[sqlx::test]` with the API
//! migrations applied. Requires `DATABASE_URL`; run with `--include-ignored`.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use rinkside_api::db::purchases::Settlement;
use rinkside_api::db::{PreferenceRepository, PurchaseRepository};
use rinkside_api::models::NewPurchase;
use rinkside_core::{Buyer, CardId, PurchaseStatus, UserId};
use rinkside_integration_tests::TestApp;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn sign_up(app: &TestApp, email: &str, first_name: &str) -> (i64, String) {
    let body = json!({
        "user": {
            "email": email,
            "password": "hunter99",
            "first_name": first_name,
            "last_name": "Skater",
        }
    });
    let resp = app
        .request(Method::POST, "/api/v1/auth/signup", None, Some(&body))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{resp:?}");
    (
        resp.body["user"]["id"].as_i64().unwrap(),
        resp.body["token"].as_str().unwrap().to_owned(),
    )
}

fn gretzky_rookie(for_sale: bool) -> Value {
    let mut card = json!({
        "player_name": "Wayne Gretzky",
        "team": "Edmonton Oilers",
        "manufacturer": "O-Pee-Chee",
        "set_name": "O-Pee-Chee",
        "card_number": "18",
        "year": 1979,
        "condition": "Near Mint",
        "rookie_card": true,
        "front_image_url": "https://img.example.com/gretzky-front.jpg",
    });
    if for_sale {
        card["for_sale"] = json!(true);
        card["asking_price"] = json!(75);
    }
    json!({ "card": card })
}

async fn create_card(app: &TestApp, token: &str, for_sale: bool) -> i64 {
    let resp = app
        .request(
            Method::POST,
            "/api/v1/cards",
            Some(token),
            Some(&gretzky_rookie(for_sale)),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{resp:?}");
    assert_eq!(resp.body["message"], "Card created successfully");
    resp.body["card"]["id"].as_i64().unwrap()
}

/// A signed `payment_intent.succeeded` payload for a registered buyer.
fn succeeded_event(intent_id: &str, card_id: i64, buyer_id: i64, seller_id: i64) -> String {
    json!({
        "id": format!("evt_{intent_id}"),
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": intent_id,
                "amount": 7500,
                "currency": "usd",
                "status": "succeeded",
                "client_secret": null,
                "last_payment_error": null,
                "metadata": {
                    "card_id": card_id.to_string(),
                    "buyer_id": buyer_id.to_string(),
                    "seller_id": seller_id.to_string(),
                }
            }
        }
    })
    .to_string()
}

fn user_id(raw: i64) -> UserId {
    UserId::new(i32::try_from(raw).unwrap())
}

fn new_purchase(card_id: i64, buyer_id: i64, seller_id: i64, intent_id: &str) -> NewPurchase {
    NewPurchase {
        card_id: CardId::new(i32::try_from(card_id).unwrap()),
        seller_id: user_id(seller_id),
        buyer: Buyer::Registered(user_id(buyer_id)),
        delivery_option_id: None,
        amount: Decimal::new(7500, 2),
        status: PurchaseStatus::Completed,
        payment_intent_id: intent_id.to_owned(),
    }
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_login_and_me(pool: PgPool) {
    let app = TestApp::new(pool);
    let (id, token) = sign_up(&app, "wayne@example.com", "Wayne").await;

    let me = app
        .request(Method::GET, "/api/v1/auth/me", Some(&token), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["id"], id);
    assert_eq!(me.body["user"]["full_name"], "Wayne Skater");

    let login = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": "WAYNE@example.com", "password": "hunter99" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "Login successful!");

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(&json!({ "email": "wayne@example.com", "password": "nope99" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, json!({ "error": "Invalid email or password" }));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_rejected(pool: PgPool) {
    let app = TestApp::new(pool);
    sign_up(&app, "mario@example.com", "Mario").await;

    let body = json!({
        "user": {
            "email": "Mario@Example.com",
            "password": "hunter99",
            "first_name": "Mario",
            "last_name": "Lemieux",
        }
    });
    let resp = app
        .request(Method::POST, "/api/v1/auth/signup", None, Some(&body))
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resp.body,
        json!({
            "error": "Failed to create account",
            "details": ["Email has already been taken"],
        })
    );
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_card_listing_and_ownership(pool: PgPool) {
    let app = TestApp::new(pool);
    let (seller_id, seller) = sign_up(&app, "seller@example.com", "Sally").await;
    let (_, other) = sign_up(&app, "other@example.com", "Oscar").await;

    let card_id = create_card(&app, &seller, true).await;
    create_card(&app, &seller, false).await;

    let market = app
        .request(Method::GET, "/api/v1/cards/marketplace", None, None)
        .await;
    assert_eq!(market.status, StatusCode::OK);
    assert_eq!(market.body["pagination"]["total_count"], 1);
    assert_eq!(market.body["cards"][0]["id"], card_id);
    assert_eq!(market.body["cards"][0]["asking_price"], 75.0);

    let mine = app
        .request(Method::GET, "/api/v1/cards/my_cards", Some(&seller), None)
        .await;
    assert_eq!(mine.body["cards"].as_array().unwrap().len(), 2);

    let search = app
        .request(Method::GET, "/api/v1/cards/search?q=gretzky", None, None)
        .await;
    assert_eq!(search.body["query"], "gretzky");
    assert_eq!(search.body["cards"].as_array().unwrap().len(), 2);

    let detail = app
        .request(Method::GET, &format!("/api/v1/cards/{card_id}"), None, None)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["card"]["owner"]["id"], seller_id);

    let hijack = app
        .request(
            Method::PATCH,
            &format!("/api/v1/cards/{card_id}"),
            Some(&other),
            Some(&json!({ "card": { "team": "Los Angeles Kings" } })),
        )
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);
    assert_eq!(hijack.body, json!({ "error": "Unauthorized" }));

    let update = app
        .request(
            Method::PATCH,
            &format!("/api/v1/cards/{card_id}"),
            Some(&seller),
            Some(&json!({ "card": { "team": "Los Angeles Kings" } })),
        )
        .await;
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(update.body["card"]["team"], "Los Angeles Kings");
    assert_eq!(update.body["card"]["player_name"], "Wayne Gretzky");

    let missing = app
        .request(Method::GET, "/api/v1/cards/999999", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, json!({ "error": "Card not found" }));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_invalid_card_reports_all_errors(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = sign_up(&app, "collector@example.com", "Cory").await;

    let body = json!({ "card": { "player_name": "W", "year": 1850, "for_sale": true } });
    let resp = app
        .request(Method::POST, "/api/v1/cards", Some(&token), Some(&body))
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["error"], "Failed to create card");
    let details: Vec<&str> = resp.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(details.contains(&"Year must be greater than 1900"), "{details:?}");
    assert!(
        details.contains(&"Asking price must be specified when card is for sale"),
        "{details:?}"
    );
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_toggle_sale(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = sign_up(&app, "toggler@example.com", "Tina").await;
    let card_id = create_card(&app, &token, false).await;
    let uri = format!("/api/v1/cards/{card_id}/toggle_sale");

    let without_price = app.request(Method::POST, &uri, Some(&token), None).await;
    assert_eq!(without_price.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(without_price.body["error"], "Failed to update sale status");

    let listed = app
        .request(
            Method::POST,
            &uri,
            Some(&token),
            Some(&json!({ "asking_price": 50 })),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["message"], "Card listed for sale");
    assert_eq!(listed.body["card"]["asking_price"], 50.0);

    let delisted = app.request(Method::POST, &uri, Some(&token), None).await;
    assert_eq!(delisted.status, StatusCode::OK);
    assert_eq!(delisted.body["message"], "Card removed from sale");
    assert_eq!(delisted.body["card"]["for_sale"], false);
    assert_eq!(delisted.body["card"]["asking_price"], Value::Null);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_delivery_options(pool: PgPool) {
    let app = TestApp::new(pool);
    let (seller_id, seller) = sign_up(&app, "shipper@example.com", "Sam").await;
    let (_, other) = sign_up(&app, "nosy@example.com", "Nora").await;

    let body = json!({
        "delivery_option": { "name": "Tracked", "duration": "3-5 days", "price": 4.5 }
    });
    let created = app
        .request(Method::POST, "/api/v1/delivery_options", Some(&seller), Some(&body))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{created:?}");
    assert_eq!(created.body["delivery_option"]["formatted_price"], "$4.50");
    let option_id = created.body["delivery_option"]["id"].as_i64().unwrap();

    let duplicate = app
        .request(Method::POST, "/api/v1/delivery_options", Some(&seller), Some(&body))
        .await;
    assert_eq!(duplicate.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        duplicate.body["details"],
        json!(["Name has already been taken"])
    );

    // Other sellers may reuse the name.
    let reused = app
        .request(Method::POST, "/api/v1/delivery_options", Some(&other), Some(&body))
        .await;
    assert_eq!(reused.status, StatusCode::CREATED);

    let public = app
        .request(
            Method::GET,
            &format!("/api/v1/delivery_options/for_seller/{seller_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.body["delivery_options"].as_array().unwrap().len(), 1);

    let foreign = app
        .request(
            Method::GET,
            &format!("/api/v1/delivery_options/{option_id}"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/delivery_options/{option_id}"),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Delivery option deleted successfully");
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_requires_seller_payouts(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, seller) = sign_up(&app, "nopayouts@example.com", "Nate").await;
    let card_id = create_card(&app, &seller, true).await;

    let resp = app
        .request(
            Method::POST,
            "/api/v1/payments/create_intent",
            None,
            Some(&json!({ "card_id": card_id, "amount": 7500 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body,
        json!({ "error": "Seller has not set up payment processing yet" })
    );

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/payments/create_intent",
            None,
            Some(&json!({ "card_id": 999_999, "amount": 7500 })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body, json!({ "error": "Card not found" }));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_settles_purchase_once(pool: PgPool) {
    let app = TestApp::new(pool);
    let (seller_id, seller) = sign_up(&app, "vendor@example.com", "Vera").await;
    let (buyer_id, buyer) = sign_up(&app, "buyer@example.com", "Bob").await;
    let card_id = create_card(&app, &seller, true).await;

    let event = succeeded_event("pi_settle_1", card_id, buyer_id, seller_id);

    for _ in 0..2 {
        let resp = app.signed_webhook(&event).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, json!({ "received": true }));
    }

    let sales = app
        .request(Method::GET, "/api/v1/payments/purchases", Some(&seller), None)
        .await;
    let sales = sales.body["purchases"].as_array().unwrap().clone();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["status"], "completed");
    assert_eq!(sales[0]["amount"], 75.0);
    assert_eq!(sales[0]["buyer_id"], buyer_id);

    let purchases = app
        .request(Method::GET, "/api/v1/payments/purchases", Some(&buyer), None)
        .await;
    assert_eq!(purchases.body["purchases"].as_array().unwrap().len(), 1);

    let card = app
        .request(Method::GET, &format!("/api/v1/cards/{card_id}"), None, None)
        .await;
    assert_eq!(card.body["card"]["for_sale"], false);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_for_unavailable_card_leaves_refund_pending(pool: PgPool) {
    let app = TestApp::new(pool);
    let (seller_id, seller) = sign_up(&app, "offmarket@example.com", "Olive").await;
    let (buyer_id, buyer) = sign_up(&app, "latecomer@example.com", "Leo").await;
    let unlisted = create_card(&app, &seller, false).await;
    let deleted = create_card(&app, &seller, true).await;

    let resp = app
        .request(
            Method::DELETE,
            &format!("/api/v1/cards/{deleted}"),
            Some(&seller),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    for (intent, card_id) in [("pi_unlisted", unlisted), ("pi_deleted", deleted)] {
        let resp = app
            .signed_webhook(&succeeded_event(intent, card_id, buyer_id, seller_id))
            .await;
        assert_eq!(resp.status, StatusCode::OK, "{resp:?}");
    }

    // The test Stripe key cannot issue refunds, so both stay pending.
    let purchases = app
        .request(Method::GET, "/api/v1/payments/purchases", Some(&buyer), None)
        .await;
    let purchases = purchases.body["purchases"].as_array().unwrap().clone();
    assert_eq!(purchases.len(), 2);
    assert!(purchases.iter().all(|p| p["status"] == "pending"), "{purchases:?}");

    let card = app
        .request(Method::GET, &format!("/api/v1/cards/{unlisted}"), None, None)
        .await;
    assert_eq!(card.body["card"]["for_sale"], false);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_settlement_is_recorded_once(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (seller_id, seller) = sign_up(&app, "once@example.com", "Owen").await;
    let (buyer_id, _) = sign_up(&app, "twice@example.com", "Tess").await;
    let (rival_id, _) = sign_up(&app, "rival@example.com", "Rita").await;
    let card_id = create_card(&app, &seller, true).await;
    let purchases = PurchaseRepository::new(&pool);

    let purchase = new_purchase(card_id, buyer_id, seller_id, "pi_once");
    let Settlement::Completed(first) = purchases.settle(&purchase).await.unwrap() else {
        panic!("first settlement should complete");
    };
    assert_eq!(first.status, PurchaseStatus::Completed);

    let Settlement::AlreadyRecorded(replayed) = purchases.settle(&purchase).await.unwrap() else {
        panic!("replay should find the existing purchase");
    };
    assert_eq!(replayed.id, first.id);

    let rival = new_purchase(card_id, rival_id, seller_id, "pi_rival");
    assert!(matches!(
        purchases.settle(&rival).await.unwrap(),
        Settlement::CardUnavailable
    ));

    assert_eq!(
        purchases
            .list_for_user(user_id(buyer_id))
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        purchases
            .list_for_user(user_id(rival_id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_card_view_counts_popularity(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = sign_up(&app, "fan@example.com", "Fiona").await;
    let card_id = create_card(&app, &token, true).await;
    let uri = format!("/api/v1/cards/{card_id}");

    for expected in 1..=3 {
        let detail = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(detail.status, StatusCode::OK);
        assert_eq!(detail.body["card"]["card_popularity"], expected);
    }

    // Listings do not count as views.
    let market = app
        .request(Method::GET, "/api/v1/cards/marketplace", None, None)
        .await;
    assert_eq!(market.body["cards"][0]["card_popularity"], 3);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_listing_pages(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = sign_up(&app, "binder@example.com", "Bea").await;
    let mut created = HashSet::new();
    for _ in 0..5 {
        created.insert(create_card(&app, &token, false).await);
    }

    let mut seen = HashSet::new();
    for (page, expected_len) in [(1, 2), (2, 2), (3, 1), (4, 0)] {
        let resp = app
            .request(
                Method::GET,
                &format!("/api/v1/cards?per_page=2&page={page}"),
                None,
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            resp.body["pagination"],
            json!({ "current_page": page, "per_page": 2, "total_pages": 3, "total_count": 5 })
        );
        let cards = resp.body["cards"].as_array().unwrap();
        assert_eq!(cards.len(), expected_len, "page {page}");
        seen.extend(cards.iter().map(|c| c["id"].as_i64().unwrap()));
    }
    assert_eq!(seen, created);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_favorite_number(pool: PgPool) {
    PreferenceRepository::new(&pool).initialize().await.unwrap();
    let app = TestApp::new(pool);

    let current = app
        .request(Method::GET, "/api/v1/preferences/favorite_number", None, None)
        .await;
    assert_eq!(current.status, StatusCode::OK);
    assert_eq!(current.body["favorite_number"], 4);
    assert_eq!(current.body["message"], "Ryan's favorite number is 4!");

    let updated = app
        .request(
            Method::POST,
            "/api/v1/preferences/favorite_number",
            None,
            Some(&json!({ "favorite_number": 7 })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Updated Ryan's favorite number to 7!");

    let from_text = app
        .request(
            Method::POST,
            "/api/v1/preferences/favorite_number",
            None,
            Some(&json!({ "favorite_number": "12" })),
        )
        .await;
    assert_eq!(from_text.status, StatusCode::OK);
    assert_eq!(from_text.body["favorite_number"], 12);
}

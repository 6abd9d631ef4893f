//! Integration tests for Rinkside.
//!
//! The API router is driven in-process with `tower::ServiceExt::oneshot`, so
//! no server needs to be running.
//!
//! # Running Tests
//!
//! ```bash
//! # Tests that never reach the database
//! cargo test -p rinkside-integration-tests
//!
//! # Full suite against a disposable PostgreSQL (one database per test)
//! DATABASE_URL=postgres://localhost/rinkside_test \
//!     cargo test -p rinkside-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `http_surface` - Routing, auth rejections, and validation without a database
//! - `marketplace_flow` - Signup through settlement against `PostgreSQL`

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use rinkside_api::config::{ApiConfig, StripeConfig};
use rinkside_api::state::AppState;
use rinkside_api::stripe::webhook;

/// Bearer token signing secret used by every test app.
pub const TEST_JWT_SECRET: &str = "t3stJwt-Q8v2Lm5Rx9Kp4Wz7Nc1Bd6Hf0Gs";

/// Webhook signing secret used by every test app.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_t3stQ8v2Lm5Rx9Kp4Wz7Nc1Bd6";

/// Configuration for an in-process test app.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/rinkside_test".to_string()),
        host: [127, 0, 0, 1].into(),
        port: 0,
        environment: "test".to_string(),
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_string()),
        frontend_url: "http://localhost:5173".to_string(),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_not_a_real_key".to_string()),
            webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET.to_string()),
            api_version: "2023-10-16".to_string(),
            destination_charges: false,
        },
        cloudinary: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
    }
}

/// A parsed response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The API router with test configuration.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// An app over `pool`.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let state = AppState::new(test_config(), pool).expect("failed to build app state");
        Self {
            router: rinkside_api::app(state),
        }
    }

    /// An app whose pool never connects; for requests rejected before any query.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool URL does not parse.
    #[must_use]
    pub fn without_database() -> Self {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://rinkside@127.0.0.1:1/unreachable")
            .expect("lazy pool");
        Self::new(pool)
    }

    /// Send a request with an optional bearer token and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request");
        self.send(request).await
    }

    /// Deliver a webhook payload signed with the test secret.
    pub async fn signed_webhook(&self, payload: &str) -> TestResponse {
        let signature = webhook::signature_header(
            payload,
            &SecretString::from(TEST_WEBHOOK_SECRET.to_string()),
            chrono::Utc::now().timestamp(),
        )
        .expect("signature");
        self.raw_webhook(payload, Some(&signature)).await
    }

    /// Deliver a webhook payload with an arbitrary signature header.
    pub async fn raw_webhook(&self, payload: &str, signature: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }

        let request = builder.body(Body::from(payload.to_owned())).expect("request");
        self.send(request).await
    }

    /// Send a prebuilt request.
    ///
    /// # Panics
    ///
    /// Panics if the response body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

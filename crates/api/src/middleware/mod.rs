//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (echo or generate `x-request-id`)
//!
//! Authentication is not a layer: handlers opt in with the [`RequireAuth`]
//! and [`OptionalAuth`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{OptionalAuth, RequireAuth, bearer_user_id};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

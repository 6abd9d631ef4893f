//! Stripe-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed before a response arrived.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Failed to parse a response.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe rejected the request. The message is Stripe's own and is safe
    /// to show to the client.
    #[error("{message}")]
    Api {
        /// HTTP status returned by Stripe.
        status: u16,
        /// Stripe's `error.message`.
        message: String,
    },

    /// An object id contained characters Stripe never issues.
    #[error("Invalid Stripe object id: {0}")]
    InvalidId(String),

    /// Webhook signature did not verify.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Webhook body is not a valid event.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

//! Stripe integration for marketplace payments.
//!
//! This module provides:
//! - [`StripeClient`] for payment intents, refunds, and Connect accounts
//! - Request/response types for the handful of objects the marketplace uses
//! - Webhook signature verification
//!
//! # Flow
//!
//! 1. The buyer's client asks for a payment intent and confirms it with Stripe.js
//! 2. Stripe calls the webhook with `payment_intent.succeeded`
//! 3. The signature is verified and the purchase is settled
//! 4. Sellers link an Express account to receive payouts

mod client;
mod error;
mod types;
pub mod webhook;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{
    Account, AccountLink, CreatePaymentIntent, Deleted, DestinationCharge, Event, EventData,
    LastPaymentError, PAYMENT_INTENT_SUCCEEDED, PaymentIntent, Refund,
};

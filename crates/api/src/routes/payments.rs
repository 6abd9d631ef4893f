//! Payment intents, Stripe webhooks, seller payout accounts, and purchases.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use rinkside_core::{Buyer, CardId, DeliveryOptionId};

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::PurchaseResponse;
use crate::services::payments::{ConnectStatus, CreatedIntent, IntentRequest, OnboardingLink};
use crate::state::AppState;
use crate::stripe::{StripeError, webhook};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /payments/create_intent` body.
#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub card_id: CardId,
    /// Total in cents.
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub delivery_option_id: Option<DeliveryOptionId>,
}

/// `POST /payments/confirm_payment` body.
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct Received {
    pub received: bool,
}

/// A settled purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseMessage {
    pub message: &'static str,
    pub purchase: PurchaseResponse,
}

/// The caller's purchases and sales.
#[derive(Debug, Serialize)]
pub struct PurchaseList {
    pub purchases: Vec<PurchaseResponse>,
}

/// A bare action message.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Start a checkout. Guests may buy; a signed-in buyer is recorded.
///
/// POST /api/v1/payments/create_intent
pub async fn create_intent(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(request): ApiJson<CreateIntentRequest>,
) -> Result<Json<CreatedIntent>> {
    let intent = state
        .payments()
        .create_intent(IntentRequest {
            card_id: request.card_id,
            amount_cents: request.amount,
            delivery_option_id: request.delivery_option_id,
            buyer: Buyer::from_user(user.map(|u| u.id)),
        })
        .await?;
    Ok(Json(intent))
}

/// Stripe event delivery.
///
/// Once the signature verifies the event is always acknowledged; settlement
/// failures are logged and reported to Sentry.
///
/// POST /api/v1/payments/webhook
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Received>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Invalid signature".into()))?;
    let payload =
        std::str::from_utf8(&body).map_err(|_| AppError::BadRequest("Invalid payload".into()))?;

    let event = webhook::construct_event(payload, signature, &state.config().stripe.webhook_secret)
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook rejected");
            match e {
                StripeError::InvalidPayload(_) => AppError::BadRequest("Invalid payload".into()),
                _ => AppError::BadRequest("Invalid signature".into()),
            }
        })?;

    let event_id = event.id.clone();
    if let Err(e) = state.payments().handle_event(event).await {
        tracing::error!(event_id = %event_id, error = %e, "Webhook handling failed");
    }

    Ok(Json(Received { received: true }))
}

/// Settle a succeeded intent without waiting for the webhook.
///
/// POST /api/v1/payments/confirm_payment
pub async fn confirm_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConfirmPaymentRequest>,
) -> Result<Json<PurchaseMessage>> {
    let purchase = state
        .payments()
        .confirm_payment(&request.payment_intent_id)
        .await?;
    Ok(Json(PurchaseMessage {
        message: "Payment confirmed",
        purchase: purchase.into(),
    }))
}

/// POST /api/v1/payments/create_connect_account
pub async fn create_connect_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<OnboardingLink>> {
    Ok(Json(state.payments().create_connect_account(&user).await?))
}

/// GET /api/v1/payments/connect_status
pub async fn connect_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ConnectStatus>> {
    Ok(Json(state.payments().connect_status(&user).await?))
}

/// DELETE /api/v1/payments/reset_connect_account
pub async fn reset_connect_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Message>> {
    state.payments().reset_connect_account(&user).await?;
    Ok(Json(Message {
        message: "Stripe account reset successfully",
    }))
}

/// GET /api/v1/payments/purchases
pub async fn purchases(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<PurchaseList>> {
    let purchases = state.payments().purchases(user.id).await?;
    Ok(Json(PurchaseList {
        purchases: purchases.into_iter().map(Into::into).collect(),
    }))
}

//! Payment orchestration.
//!
//! Coordinates card sale state with Stripe: builds payment intents with the
//! marketplace fee split, settles successful payments into purchase records,
//! and manages sellers' Connect accounts.

use std::str::FromStr;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use rinkside_core::price::{PriceError, from_cents, to_cents};
use rinkside_core::{
    Buyer, CardId, DeliveryOptionId, FeeSplit, PaymentAccountStatus, PurchaseStatus, UserId,
};

use crate::config::ApiConfig;
use crate::db::purchases::Settlement;
use crate::db::{
    CardRepository, DeliveryOptionRepository, PurchaseRepository, RepositoryError, UserRepository,
};
use crate::models::purchase::{NewPurchase, Purchase};
use crate::models::user::User;
use crate::stripe::{
    CreatePaymentIntent, DestinationCharge, Event, PaymentIntent, StripeClient, StripeError,
};

/// Currency for every charge.
pub const CURRENCY: &str = "usd";

/// Metadata keys written on payment intents.
pub mod metadata {
    pub const CARD_ID: &str = "card_id";
    pub const BUYER_ID: &str = "buyer_id";
    pub const SELLER_ID: &str = "seller_id";
    pub const SELLER_AMOUNT: &str = "seller_amount";
    pub const PLATFORM_FEE: &str = "platform_fee";
    pub const DELIVERY_OPTION_ID: &str = "delivery_option_id";
}

const NO_PAYMENT_ACCOUNT: &str = "Seller has not set up payment processing yet";

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The request cannot be honored as made.
    #[error("{0}")]
    BadRequest(String),

    /// Stripe rejected or failed the call.
    #[error(transparent)]
    Stripe(#[from] StripeError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PriceError> for PaymentError {
    fn from(e: PriceError) -> Self {
        Self::BadRequest(format!("Invalid amount: {e}"))
    }
}

/// Result of creating a payment intent.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// Onboarding link for a seller's connected account.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingLink {
    pub account_id: String,
    pub onboarding_url: String,
}

/// Seller payout account state.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectStatus {
    pub status: PaymentAccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charges_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_submitted: Option<bool>,
}

/// A request to pay for a card.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub card_id: CardId,
    /// Total charge in cents, as computed by the client.
    pub amount_cents: i64,
    pub delivery_option_id: Option<DeliveryOptionId>,
    pub buyer: Buyer,
}

/// Payment orchestration service.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
    stripe: &'a StripeClient,
    config: &'a ApiConfig,
}

impl<'a> PaymentService<'a> {
    /// Create a new payment service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: &'a StripeClient, config: &'a ApiConfig) -> Self {
        Self {
            pool,
            stripe,
            config,
        }
    }

    /// Create a payment intent for a card.
    ///
    /// The amount must cover the asking price plus the chosen delivery option;
    /// anything above that (the processing surcharge) is left to the client.
    /// The platform fee is taken from the asking price only.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for an unknown card or delivery option,
    /// `PaymentError::BadRequest` if the card cannot be bought for this
    /// amount, and `PaymentError::Stripe` if Stripe rejects the intent.
    #[instrument(skip(self), fields(card_id = %request.card_id, buyer = %request.buyer))]
    pub async fn create_intent(&self, request: IntentRequest) -> Result<CreatedIntent, PaymentError> {
        let card = CardRepository::new(self.pool)
            .get(request.card_id)
            .await?
            .ok_or(PaymentError::NotFound("Card not found"))?;

        let asking_price = match card.fields.asking_price {
            Some(price) if card.fields.for_sale => price,
            _ => return Err(PaymentError::BadRequest("Card is not for sale".to_owned())),
        };

        let seller = UserRepository::new(self.pool)
            .get_by_id(card.owner_id)
            .await?
            .ok_or_else(|| PaymentError::BadRequest(NO_PAYMENT_ACCOUNT.to_owned()))?;
        let account_id = seller
            .payment_account_id
            .ok_or_else(|| PaymentError::BadRequest(NO_PAYMENT_ACCOUNT.to_owned()))?;

        if request.amount_cents <= 0 {
            return Err(PaymentError::BadRequest("Amount must be positive".to_owned()));
        }

        let listing_cents = to_cents(asking_price)?;
        let delivery_cents = match request.delivery_option_id {
            None => 0,
            Some(id) => {
                let option = DeliveryOptionRepository::new(self.pool)
                    .get(id)
                    .await?
                    .ok_or(PaymentError::NotFound("Delivery option not found"))?;
                if option.seller_id != card.owner_id {
                    return Err(PaymentError::BadRequest(
                        "Delivery option is not offered by this seller".to_owned(),
                    ));
                }
                to_cents(option.price)?
            }
        };

        let minimum = listing_cents.saturating_add(delivery_cents);
        if request.amount_cents < minimum {
            return Err(PaymentError::BadRequest(format!(
                "Amount must be at least {minimum} cents"
            )));
        }

        let split = FeeSplit::new(request.amount_cents, listing_cents);
        let params = intent_params(
            &request,
            card.owner_id,
            &split,
            self.config
                .stripe
                .destination_charges
                .then_some(account_id),
        );

        let intent = self.stripe.create_payment_intent(&params).await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            StripeError::Response("payment intent has no client_secret".to_owned())
        })?;

        info!(
            payment_intent_id = %intent.id,
            amount_cents = split.amount_cents,
            platform_fee_cents = split.platform_fee_cents,
            "Payment intent created"
        );

        Ok(CreatedIntent {
            client_secret,
            payment_intent_id: intent.id,
        })
    }

    /// React to a verified webhook event.
    ///
    /// # Errors
    ///
    /// Returns an error if settlement fails. The caller still acknowledges the
    /// event.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.kind))]
    pub async fn handle_event(&self, event: Event) -> Result<(), PaymentError> {
        match event.kind.as_str() {
            "payment_intent.succeeded" => {
                let intent: PaymentIntent = serde_json::from_value(event.data.object)
                    .map_err(|e| StripeError::InvalidPayload(e.to_string()))?;
                self.settle(&intent).await.map(|_| ())
            }
            "payment_intent.payment_failed" => {
                let intent: PaymentIntent = serde_json::from_value(event.data.object)
                    .map_err(|e| StripeError::InvalidPayload(e.to_string()))?;
                let reason = intent
                    .last_payment_error
                    .as_ref()
                    .and_then(|e| e.message.as_deref())
                    .unwrap_or("unknown");
                warn!(payment_intent_id = %intent.id, reason = %reason, "Payment failed");
                Ok(())
            }
            other => {
                debug!(event_type = %other, "Ignoring webhook event");
                Ok(())
            }
        }
    }

    /// Manually settle a payment when the webhook cannot reach the server.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::BadRequest` if the intent has not succeeded.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, payment_intent_id: &str) -> Result<Purchase, PaymentError> {
        let intent = self.stripe.retrieve_payment_intent(payment_intent_id).await?;
        if !intent.succeeded() {
            return Err(PaymentError::BadRequest(format!(
                "Payment has not succeeded (status: {})",
                intent.status
            )));
        }
        self.settle(&intent).await
    }

    /// Record a successful payment.
    ///
    /// Idempotent per payment intent. If the card was sold to someone else (or
    /// deleted) in the meantime, the buyer is refunded and the purchase is
    /// recorded as `refunded`, or `pending` when the refund itself fails.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::BadRequest` if the intent lacks marketplace
    /// metadata, or a repository error.
    #[instrument(skip(self, intent), fields(payment_intent_id = %intent.id))]
    pub async fn settle(&self, intent: &PaymentIntent) -> Result<Purchase, PaymentError> {
        let purchase = purchase_from_intent(intent)?;
        let purchases = PurchaseRepository::new(self.pool);

        match purchases.settle(&purchase).await {
            Ok(Settlement::Completed(recorded)) => {
                info!(
                    purchase_id = %recorded.id,
                    card_id = %recorded.card_id,
                    amount = %recorded.amount,
                    "Purchase completed"
                );
                Ok(recorded)
            }
            Ok(Settlement::AlreadyRecorded(existing)) => {
                info!(purchase_id = %existing.id, "Payment intent already settled");
                Ok(existing)
            }
            Ok(Settlement::CardUnavailable) => self.refund_unavailable(purchase).await,
            Err(RepositoryError::Conflict(_)) => {
                info!("Payment intent settled concurrently");
                purchases
                    .get_by_payment_intent(&intent.id)
                    .await?
                    .ok_or(PaymentError::Repository(RepositoryError::NotFound))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn refund_unavailable(&self, mut purchase: NewPurchase) -> Result<Purchase, PaymentError> {
        warn!(card_id = %purchase.card_id, "Card no longer available, refunding buyer");

        purchase.status = match self.stripe.create_refund(&purchase.payment_intent_id).await {
            Ok(_) => PurchaseStatus::Refunded,
            Err(e) => {
                error!(error = %e, "Refund failed; purchase left pending for manual follow-up");
                PurchaseStatus::Pending
            }
        };

        let purchases = PurchaseRepository::new(self.pool);
        match purchases.record(&purchase).await {
            Ok(recorded) => Ok(recorded),
            Err(RepositoryError::Conflict(_)) => purchases
                .get_by_payment_intent(&purchase.payment_intent_id)
                .await?
                .ok_or(PaymentError::Repository(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create (or reuse) the user's Express account and an onboarding link.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if Stripe rejects either call.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_connect_account(&self, user: &User) -> Result<OnboardingLink, PaymentError> {
        let account_id = match &user.payment_account_id {
            Some(id) => id.clone(),
            None => {
                let account = self.stripe.create_account(user.email.as_str()).await?;
                UserRepository::new(self.pool)
                    .set_payment_account(user.id, &account.id)
                    .await?;
                info!(account_id = %account.id, "Connected account linked");
                account.id
            }
        };

        let base = self.config.frontend_url.trim_end_matches('/');
        let link = self
            .stripe
            .create_account_link(
                &account_id,
                &format!("{base}/payment-setup?refresh=true"),
                &format!("{base}/payment-setup?success=true"),
            )
            .await?;

        Ok(OnboardingLink {
            account_id,
            onboarding_url: link.url,
        })
    }

    /// Report the user's payout account state, recording onboarding completion.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if the account cannot be retrieved.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn connect_status(&self, user: &User) -> Result<ConnectStatus, PaymentError> {
        let Some(account_id) = &user.payment_account_id else {
            return Ok(ConnectStatus {
                status: PaymentAccountStatus::NotConnected,
                account_id: None,
                charges_enabled: None,
                details_submitted: None,
            });
        };

        let account = self.stripe.retrieve_account(account_id).await?;
        UserRepository::new(self.pool)
            .set_onboarding_completed(user.id, account.charges_enabled)
            .await?;

        Ok(ConnectStatus {
            status: PaymentAccountStatus::from_charges_enabled(account.charges_enabled),
            account_id: Some(account.id),
            charges_enabled: Some(account.charges_enabled),
            details_submitted: Some(account.details_submitted),
        })
    }

    /// Delete the user's connected account and unlink it.
    ///
    /// An account Stripe no longer knows about is unlinked without error.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Stripe` if Stripe refuses the deletion.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn reset_connect_account(&self, user: &User) -> Result<(), PaymentError> {
        if let Some(account_id) = &user.payment_account_id {
            match self.stripe.delete_account(account_id).await {
                Ok(_) | Err(StripeError::Api { status: 404, .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        UserRepository::new(self.pool)
            .clear_payment_account(user.id)
            .await?;
        info!("Connected account reset");
        Ok(())
    }

    /// Purchases where the user is buyer or seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn purchases(&self, user_id: UserId) -> Result<Vec<Purchase>, PaymentError> {
        Ok(PurchaseRepository::new(self.pool).list_for_user(user_id).await?)
    }
}

/// Build the Stripe parameters for an intent. `destination` is the seller's
/// connected account when destination charges are enabled.
fn intent_params(
    request: &IntentRequest,
    seller_id: UserId,
    split: &FeeSplit,
    destination: Option<String>,
) -> CreatePaymentIntent {
    let mut metadata = vec![
        (metadata::CARD_ID.to_owned(), request.card_id.to_string()),
        (metadata::BUYER_ID.to_owned(), request.buyer.to_string()),
        (metadata::SELLER_ID.to_owned(), seller_id.to_string()),
        (
            metadata::SELLER_AMOUNT.to_owned(),
            split.seller_amount_cents.to_string(),
        ),
        (
            metadata::PLATFORM_FEE.to_owned(),
            split.platform_fee_cents.to_string(),
        ),
    ];
    if let Some(id) = request.delivery_option_id {
        metadata.push((metadata::DELIVERY_OPTION_ID.to_owned(), id.to_string()));
    }

    CreatePaymentIntent {
        amount: split.amount_cents,
        currency: CURRENCY.to_owned(),
        metadata,
        destination: destination.map(|destination| DestinationCharge {
            destination,
            application_fee_amount: split.platform_fee_cents,
        }),
    }
}

/// Decode the marketplace metadata of a succeeded intent.
fn purchase_from_intent(intent: &PaymentIntent) -> Result<NewPurchase, PaymentError> {
    fn required<T: FromStr>(intent: &PaymentIntent, key: &str) -> Result<T, PaymentError> {
        intent
            .metadata_value(key)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                PaymentError::BadRequest(format!("Payment intent is missing {key} metadata"))
            })
    }

    Ok(NewPurchase {
        card_id: required(intent, metadata::CARD_ID)?,
        seller_id: required(intent, metadata::SELLER_ID)?,
        buyer: Buyer::from_metadata(intent.metadata_value(metadata::BUYER_ID)),
        delivery_option_id: intent
            .metadata_value(metadata::DELIVERY_OPTION_ID)
            .and_then(|v| v.parse().ok()),
        amount: from_cents(intent.amount),
        status: PurchaseStatus::Completed,
        payment_intent_id: intent.id.clone(),
    })
}

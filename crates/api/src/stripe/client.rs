//! Stripe REST API client.
//!
//! Requests are form-encoded, authenticated with the secret key, and pinned to
//! the configured API version.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::error::StripeError;
use super::types::{
    Account, AccountLink, ApiErrorBody, CreatePaymentIntent, Deleted, PaymentIntent, Refund,
};

/// Stripe API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    /// HTTP client.
    client: Client,
    /// Secret API key.
    secret_key: SecretString,
    /// Value of the `Stripe-Version` header.
    api_version: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// Stripe object ids are ASCII alphanumerics and underscores.
fn check_id(id: &str) -> Result<&str, StripeError> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Ok(id)
    } else {
        Err(StripeError::InvalidId(id.to_owned()))
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Request` if the HTTP client cannot be built.
    pub fn new(secret_key: SecretString, api_version: String) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            secret_key,
            api_version,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StripeError> {
        let response = request
            .bearer_auth(self.secret_key.expose_secret())
            .header("Stripe-Version", &self.api_version)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StripeError::Response(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe returned {status}"));
            warn!(status = %status, message = %message, "Stripe API error");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| StripeError::Response(e.to_string()))
    }

    /// Create a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` with Stripe's message if the intent is rejected.
    #[instrument(skip(self, params), fields(amount = params.amount))]
    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let intent: PaymentIntent = self
            .send(
                self.client
                    .post(format!("{STRIPE_API_BASE}/payment_intents"))
                    .form(&params.to_form()),
            )
            .await?;

        debug!(payment_intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    /// Retrieve a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe does not know the intent.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        let id = check_id(id)?;
        self.send(self.client.get(format!("{STRIPE_API_BASE}/payment_intents/{id}")))
            .await
    }

    /// Create an Express connected account for a US seller.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe rejects the account.
    #[instrument(skip(self, email))]
    pub async fn create_account(&self, email: &str) -> Result<Account, StripeError> {
        let form = [
            ("type", "express"),
            ("country", "US"),
            ("email", email),
            ("capabilities[card_payments][requested]", "true"),
            ("capabilities[transfers][requested]", "true"),
        ];

        let account: Account = self
            .send(
                self.client
                    .post(format!("{STRIPE_API_BASE}/accounts"))
                    .form(&form),
            )
            .await?;

        debug!(account_id = %account.id, "Connected account created");
        Ok(account)
    }

    /// Create an onboarding link for a connected account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe rejects the link.
    #[instrument(skip(self))]
    pub async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, StripeError> {
        let account_id = check_id(account_id)?;
        let form = [
            ("account", account_id),
            ("refresh_url", refresh_url),
            ("return_url", return_url),
            ("type", "account_onboarding"),
        ];

        self.send(
            self.client
                .post(format!("{STRIPE_API_BASE}/account_links"))
                .form(&form),
        )
        .await
    }

    /// Retrieve a connected account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if the account does not exist.
    #[instrument(skip(self))]
    pub async fn retrieve_account(&self, account_id: &str) -> Result<Account, StripeError> {
        let account_id = check_id(account_id)?;
        self.send(self.client.get(format!("{STRIPE_API_BASE}/accounts/{account_id}")))
            .await
    }

    /// Delete a connected account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe refuses the deletion.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, account_id: &str) -> Result<Deleted, StripeError> {
        let account_id = check_id(account_id)?;
        self.send(
            self.client
                .delete(format!("{STRIPE_API_BASE}/accounts/{account_id}")),
        )
        .await
    }

    /// Refund a payment intent in full.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if the refund is rejected.
    #[instrument(skip(self))]
    pub async fn create_refund(&self, payment_intent_id: &str) -> Result<Refund, StripeError> {
        let payment_intent_id = check_id(payment_intent_id)?;
        let refund: Refund = self
            .send(
                self.client
                    .post(format!("{STRIPE_API_BASE}/refunds"))
                    .form(&[("payment_intent", payment_intent_id)]),
            )
            .await?;

        debug!(refund_id = %refund.id, "Refund created");
        Ok(refund)
    }
}

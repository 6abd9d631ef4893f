//! Stripe API objects and request parameters.
//!
//! Only the fields the marketplace reads are modeled; everything else in
//! Stripe's responses is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Payment intent status that means the charge went through.
pub const PAYMENT_INTENT_SUCCEEDED: &str = "succeeded";

/// A `payment_intent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in the smallest currency unit (cents).
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub last_payment_error: Option<LastPaymentError>,
}

impl PaymentIntent {
    /// A metadata value by key.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Whether the intent has been paid.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == PAYMENT_INTENT_SUCCEEDED
    }
}

/// Details of the most recent failed charge attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct LastPaymentError {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A connected (Express) account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
}

/// A one-time onboarding link.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountLink {
    pub url: String,
    pub expires_at: i64,
}

/// A refund of a payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub status: Option<String>,
}

/// Response to a delete call.
#[derive(Debug, Clone, Deserialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// A webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

/// The object an event is about.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Stripe's error envelope.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorDetail {
    pub message: Option<String>,
}

/// Where a destination charge's funds go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationCharge {
    /// Connected account receiving the transfer.
    pub destination: String,
    /// Platform fee withheld, in cents.
    pub application_fee_amount: i64,
}

/// Parameters for `POST /v1/payment_intents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentIntent {
    /// Amount in cents.
    pub amount: i64,
    pub currency: String,
    pub metadata: Vec<(String, String)>,
    /// `None` keeps the funds on the platform account.
    pub destination: Option<DestinationCharge>,
}

impl CreatePaymentIntent {
    /// Encode as Stripe's bracketed form fields.
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_owned(), self.amount.to_string()),
            ("currency".to_owned(), self.currency.clone()),
            ("automatic_payment_methods[enabled]".to_owned(), "true".to_owned()),
        ];

        for (key, value) in &self.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        if let Some(dest) = &self.destination {
            form.push((
                "application_fee_amount".to_owned(),
                dest.application_fee_amount.to_string(),
            ));
            form.push(("on_behalf_of".to_owned(), dest.destination.clone()));
            form.push(("transfer_data[destination]".to_owned(), dest.destination.clone()));
        }

        form
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(destination: Option<DestinationCharge>) -> CreatePaymentIntent {
        CreatePaymentIntent {
            amount: 7875,
            currency: "usd".to_string(),
            metadata: vec![
                ("card_id".to_string(), "9".to_string()),
                ("buyer_id".to_string(), "guest".to_string()),
            ],
            destination,
        }
    }

    fn get<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_platform_mode_form() {
        let form = params(None).to_form();
        assert_eq!(get(&form, "amount"), Some("7875"));
        assert_eq!(get(&form, "currency"), Some("usd"));
        assert_eq!(get(&form, "metadata[buyer_id]"), Some("guest"));
        assert_eq!(get(&form, "application_fee_amount"), None);
        assert_eq!(get(&form, "transfer_data[destination]"), None);
    }

    #[test]
    fn test_destination_mode_form() {
        let form = params(Some(DestinationCharge {
            destination: "acct_123".to_string(),
            application_fee_amount: 375,
        }))
        .to_form();
        assert_eq!(get(&form, "application_fee_amount"), Some("375"));
        assert_eq!(get(&form, "on_behalf_of"), Some("acct_123"));
        assert_eq!(get(&form, "transfer_data[destination]"), Some("acct_123"));
    }

    #[test]
    fn test_payment_intent_parses_stripe_json() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 7875,
                "currency": "usd",
                "status": "succeeded",
                "client_secret": "pi_123_secret_abc",
                "metadata": {"card_id": "9", "buyer_id": "guest"},
                "last_payment_error": null
            }"#,
        )
        .unwrap();
        assert!(intent.succeeded());
        assert_eq!(intent.metadata_value("card_id"), Some("9"));
        assert_eq!(intent.metadata_value("seller_id"), None);
    }

    #[test]
    fn test_event_parses_type() {
        let event: Event = serde_json::from_str(
            r#"{"id": "evt_1", "type": "payment_intent.succeeded", "data": {"object": {"id": "pi_1"}}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, "payment_intent.succeeded");
        assert_eq!(event.data.object["id"], "pi_1");
    }
}

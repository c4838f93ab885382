//! Stripe REST client.
//!
//! Talks to the Payment Intents API with form-encoded requests and verifies
//! webhook signatures. Nothing is retried; a failed call is reported to the
//! caller as-is.

mod error;
mod types;
mod webhook;

pub use error::StripeError;
pub use types::{Event, EventData, PaymentIntent};
pub use webhook::{SIGNATURE_TOLERANCE_SECS, verify_signature};

use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use modvault_core::CurrencyCode;
use modvault_core::pricing::to_minor_units;
use modvault_core::types::OrderKind;

use crate::config::StripeConfig;

/// Smallest charge Stripe accepts for card payments in USD, in cents.
pub const MIN_CHARGE_MINOR_UNITS: i64 = 50;

/// Whether `id` has the shape of a payment intent id: `pi_` then letters and
/// digits.
#[must_use]
pub fn is_payment_intent_id(id: &str) -> bool {
    id.strip_prefix("pi_")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// Metadata attached to every payment intent we create.
#[derive(Debug, Clone, Copy)]
pub struct IntentMetadata<'a> {
    pub user_id: &'a str,
    pub kind: OrderKind,
    /// Tier being bought, for subscription intents.
    pub tier_id: Option<&'a str>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    webhook_secret: SecretString,
    currency: CurrencyCode,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            currency: config.currency,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Create a payment intent for `amount` in the configured currency.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` with Stripe's message if the call is
    /// rejected, or `StripeError::AmountOutOfRange` for unrepresentable amounts.
    #[instrument(skip(self), fields(kind = metadata.kind.as_str()))]
    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        metadata: IntentMetadata<'_>,
    ) -> Result<PaymentIntent, StripeError> {
        let minor = to_minor_units(amount).ok_or(StripeError::AmountOutOfRange)?;

        let mut form = vec![
            ("amount", minor.to_string()),
            ("currency", self.currency.stripe_code().to_owned()),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
            ("metadata[user_id]", metadata.user_id.to_owned()),
            ("metadata[kind]", metadata.kind.as_str().to_owned()),
        ];
        if let Some(tier_id) = metadata.tier_id {
            form.push(("metadata[tier_id]", tier_id.to_owned()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let intent: PaymentIntent = Self::parse(response).await?;
        debug!(intent_id = %intent.id, amount = intent.amount, "Payment intent created");
        Ok(intent)
    }

    /// Fetch a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidIntentId` without calling Stripe when `id`
    /// is not a payment intent id, and `StripeError::Api` with Stripe's
    /// message if the call is rejected.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        if !is_payment_intent_id(id) {
            return Err(StripeError::InvalidIntentId);
        }
        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{id}", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Self::parse(response).await
    }

    /// Verify a webhook delivery and decode the event.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidSignature` or `StripeError::InvalidPayload`.
    pub fn construct_event(
        &self,
        payload: &str,
        signature_header: &str,
    ) -> Result<Event, StripeError> {
        let now = chrono::Utc::now().timestamp();
        verify_signature(
            self.webhook_secret.expose_secret().as_bytes(),
            payload,
            signature_header,
            now,
        )?;
        serde_json::from_str(payload).map_err(|e| StripeError::InvalidPayload(e.to_string()))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StripeError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StripeError::Response(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<types::ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe returned {status}"));
            warn!(status = status.as_u16(), %message, "Stripe API error");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| StripeError::Response(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_id_shape() {
        assert!(is_payment_intent_id("pi_3MtwBwLkdIwHu7ix28a3tqPa"));
        assert!(!is_payment_intent_id("pi_"));
        assert!(!is_payment_intent_id("ch_3MtwBwLkdIwHu7ix"));
        assert!(!is_payment_intent_id("pi_123/../../v1/customers"));
        assert!(!is_payment_intent_id("pi_123?expand[]=customer"));
        assert!(!is_payment_intent_id(""));
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_stripe() {
        let client = StripeClient::new(&StripeConfig {
            secret_key: SecretString::from("sk_test_unused"),
            publishable_key: "pk_test_unused".to_owned(),
            webhook_secret: SecretString::from("whsec_unused"),
            currency: CurrencyCode::USD,
            // Nothing listens here; a request would fail with `Request`
            api_base: "http://127.0.0.1:1".to_owned(),
        });
        let err = client.retrieve_payment_intent("pi_1/refunds").await.unwrap_err();
        assert!(matches!(err, StripeError::InvalidIntentId));
    }
}

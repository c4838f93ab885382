//! Checkout start, payment confirmation and fulfilment.
//!
//! Starting a cart checkout records the priced lines against the new payment
//! intent. Fulfilment reads those lines back, so a cart edited after payment
//! began cannot change what was bought. A cart that costs nothing is recorded
//! straight away without Stripe.
//!
//! The confirm endpoints and the Stripe webhook both end up here. Fulfilment
//! is keyed on the payment intent id, so whichever arrives second finds the
//! order already recorded and returns it unchanged.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use modvault_core::checkout::PaymentStatus;
use modvault_core::pricing::{CartItem, to_minor_units};
use modvault_core::types::OrderKind;
use modvault_core::{TierId, UserId};

use crate::db::orders::{CheckoutLine, Fulfilment, NewOrder, lines_total};
use crate::db::{OrderRepository, RepositoryError, SubscriptionRepository};
use crate::models::Subscription;
use crate::services::stripe::{
    IntentMetadata, MIN_CHARGE_MINOR_UNITS, PaymentIntent, StripeClient, StripeError,
};

/// Webhook event type that triggers fulfilment.
pub const PAYMENT_SUCCEEDED_EVENT: &str = "payment_intent.succeeded";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The intent was created for someone else or for a different purchase.
    #[error("payment does not belong to this checkout")]
    IntentMismatch,

    /// Provider has not captured the payment.
    #[error("payment not completed (status: {0})")]
    NotSucceeded(PaymentStatus),

    /// The recorded lines do not add up to what was charged.
    #[error("order total does not match the payment amount")]
    AmountMismatch,

    #[error("cart is empty")]
    EmptyCart,

    /// Non-zero totals under the card minimum cannot be charged.
    #[error("order total is below the minimum card payment")]
    BelowMinimum,

    #[error("subscription tier not found")]
    TierNotFound,
}

/// How a cart checkout began.
#[derive(Debug)]
pub enum CartCheckout {
    /// The browser must now collect payment for this intent.
    Payment(PaymentIntent),
    /// Everything in the cart was free; the order is already recorded.
    Free(Fulfilment),
}

/// What a webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored,
    Fulfilled,
    AlreadyFulfilled,
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    stripe: &'a StripeClient,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: &'a StripeClient) -> Self {
        Self { pool, stripe }
    }

    /// Price the cart and either open a payment intent for it or, when it
    /// costs nothing, record the order immediately.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` before contacting Stripe when there
    /// is nothing in the cart, `CheckoutError::BelowMinimum` for totals Stripe
    /// would refuse, and `CheckoutError::Stripe` when the provider fails.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn start_cart(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<CartCheckout, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let lines: Vec<CheckoutLine> = items.iter().map(CheckoutLine::from).collect();
        let total = lines_total(&lines);
        let orders = OrderRepository::new(self.pool);

        if total.is_zero() {
            let reference = free_order_reference();
            let order = NewOrder {
                user_id,
                payment_intent_id: &reference,
                kind: OrderKind::Cart,
                amount: Decimal::ZERO,
                currency: self.stripe.currency().stripe_code(),
                status: PaymentStatus::Succeeded.as_str(),
            };
            let fulfilment = orders.fulfil_cart(order, &lines).await?;
            info!(order_id = %fulfilment.order.id, user_id = %user_id, "Free order recorded");
            return Ok(CartCheckout::Free(fulfilment));
        }

        let minor = to_minor_units(total).ok_or(StripeError::AmountOutOfRange)?;
        if minor < MIN_CHARGE_MINOR_UNITS {
            return Err(CheckoutError::BelowMinimum);
        }

        let owner = user_id.to_string();
        let intent = self
            .stripe
            .create_payment_intent(
                total,
                IntentMetadata {
                    user_id: &owner,
                    kind: OrderKind::Cart,
                    tier_id: None,
                },
            )
            .await?;
        orders.record_checkout(&intent.id, user_id, &lines).await?;

        info!(intent_id = %intent.id, total = %total, "Checkout started");
        Ok(CartCheckout::Payment(intent))
    }

    /// Confirm a cart payment from the browser.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSucceeded` with the provider status when
    /// the payment is not complete; the cart is left untouched.
    #[instrument(skip(self))]
    pub async fn confirm_cart(
        &self,
        user_id: UserId,
        intent_id: &str,
    ) -> Result<Fulfilment, CheckoutError> {
        let intent = self.stripe.retrieve_payment_intent(intent_id).await?;
        check_intent(&intent, user_id, OrderKind::Cart)?;
        self.fulfil_cart(user_id, &intent).await
    }

    /// Confirm a subscription payment from the browser.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSucceeded` when the payment is not complete.
    #[instrument(skip(self))]
    pub async fn confirm_subscription(
        &self,
        user_id: UserId,
        intent_id: &str,
    ) -> Result<Subscription, CheckoutError> {
        let intent = self.stripe.retrieve_payment_intent(intent_id).await?;
        check_intent(&intent, user_id, OrderKind::Subscription)?;
        let (subscription, _) = self.fulfil_subscription(user_id, &intent).await?;
        Ok(subscription)
    }

    /// Handle a verified `payment_intent.succeeded` payload.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IntentMismatch` if the intent carries no
    /// usable metadata.
    #[instrument(skip(self, intent), fields(intent_id = %intent.id))]
    pub async fn fulfil_from_webhook(
        &self,
        intent: &PaymentIntent,
    ) -> Result<WebhookOutcome, CheckoutError> {
        if !intent.status.is_succeeded() {
            return Ok(WebhookOutcome::Ignored);
        }

        let user_id = intent
            .metadata("user_id")
            .and_then(|v| v.parse::<i32>().ok())
            .map(UserId::new)
            .ok_or(CheckoutError::IntentMismatch)?;
        let kind = intent
            .metadata("kind")
            .and_then(|v| v.parse::<OrderKind>().ok())
            .ok_or(CheckoutError::IntentMismatch)?;

        let newly = match kind {
            OrderKind::Cart => self.fulfil_cart(user_id, intent).await?.newly_fulfilled,
            OrderKind::Subscription => self.fulfil_subscription(user_id, intent).await?.1,
        };

        Ok(if newly {
            WebhookOutcome::Fulfilled
        } else {
            WebhookOutcome::AlreadyFulfilled
        })
    }

    async fn fulfil_cart(
        &self,
        user_id: UserId,
        intent: &PaymentIntent,
    ) -> Result<Fulfilment, CheckoutError> {
        let orders = OrderRepository::new(self.pool);
        if let Some(order) = orders.find_by_intent(&intent.id).await? {
            return Ok(Fulfilment {
                order,
                newly_fulfilled: false,
            });
        }

        let lines = orders.checkout_lines(&intent.id, user_id).await?;
        if lines.is_empty() {
            warn!(intent_id = %intent.id, user_id = %user_id, "No checkout recorded for intent");
            return Err(CheckoutError::IntentMismatch);
        }
        let charged = lines_total(&lines);
        if to_minor_units(charged) != Some(intent.amount) {
            error!(
                intent_id = %intent.id,
                charged = intent.amount,
                recorded_total = %charged,
                "Recorded checkout differs from payment amount"
            );
            return Err(CheckoutError::AmountMismatch);
        }

        let fulfilment = orders
            .fulfil_cart(new_order(user_id, intent, OrderKind::Cart), &lines)
            .await?;

        if fulfilment.newly_fulfilled {
            info!(
                order_id = %fulfilment.order.id,
                user_id = %user_id,
                items = lines.len(),
                "Cart order fulfilled"
            );
        }
        Ok(fulfilment)
    }

    /// Returns the subscription and whether this call created it.
    async fn fulfil_subscription(
        &self,
        user_id: UserId,
        intent: &PaymentIntent,
    ) -> Result<(Subscription, bool), CheckoutError> {
        let subscriptions = SubscriptionRepository::new(self.pool);

        let tier_id = intent
            .metadata("tier_id")
            .and_then(|v| v.parse::<i32>().ok())
            .map(TierId::new)
            .ok_or(CheckoutError::IntentMismatch)?;
        let tier = subscriptions
            .get_tier(tier_id)
            .await?
            .ok_or(CheckoutError::TierNotFound)?;
        if to_minor_units(tier.price) != Some(intent.amount) {
            return Err(CheckoutError::AmountMismatch);
        }

        let order = new_order(user_id, intent, OrderKind::Subscription);
        if let Some(subscription) = subscriptions.activate(order, &tier).await? {
            info!(
                subscription_id = %subscription.id,
                user_id = %user_id,
                tier = %tier.name,
                "Subscription activated"
            );
            return Ok((subscription, true));
        }

        let existing = subscriptions
            .current(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok((existing, false))
    }
}

/// Stands in for a payment intent id on orders that never reached Stripe.
fn free_order_reference() -> String {
    format!("free_{}", Uuid::new_v4().simple())
}

/// The intent must be for this user and this kind of purchase, and captured.
fn check_intent(
    intent: &PaymentIntent,
    user_id: UserId,
    kind: OrderKind,
) -> Result<(), CheckoutError> {
    let owner = user_id.to_string();
    if intent.metadata("user_id") != Some(owner.as_str())
        || intent.metadata("kind") != Some(kind.as_str())
    {
        warn!(intent_id = %intent.id, user_id = %user_id, "Payment intent metadata mismatch");
        return Err(CheckoutError::IntentMismatch);
    }
    if !intent.status.is_succeeded() {
        return Err(CheckoutError::NotSucceeded(intent.status));
    }
    Ok(())
}

fn new_order(user_id: UserId, intent: &PaymentIntent, kind: OrderKind) -> NewOrder<'_> {
    NewOrder {
        user_id,
        payment_intent_id: &intent.id,
        kind,
        amount: Decimal::new(intent.amount, 2),
        currency: &intent.currency,
        status: intent.status.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn intent(status: PaymentStatus, user: &str, kind: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".into(),
            client_secret: None,
            amount: 2500,
            currency: "usd".into(),
            status,
            metadata: HashMap::from([
                ("user_id".to_owned(), user.to_owned()),
                ("kind".to_owned(), kind.to_owned()),
            ]),
        }
    }

    #[test]
    fn test_check_intent_accepts_matching_succeeded() {
        let pi = intent(PaymentStatus::Succeeded, "7", "cart");
        assert!(check_intent(&pi, UserId::new(7), OrderKind::Cart).is_ok());
    }

    #[test]
    fn test_check_intent_rejects_other_user() {
        let pi = intent(PaymentStatus::Succeeded, "8", "cart");
        assert!(matches!(
            check_intent(&pi, UserId::new(7), OrderKind::Cart),
            Err(CheckoutError::IntentMismatch)
        ));
    }

    #[test]
    fn test_check_intent_rejects_wrong_kind() {
        let pi = intent(PaymentStatus::Succeeded, "7", "subscription");
        assert!(matches!(
            check_intent(&pi, UserId::new(7), OrderKind::Cart),
            Err(CheckoutError::IntentMismatch)
        ));
    }

    #[test]
    fn test_check_intent_reports_provider_status() {
        let pi = intent(PaymentStatus::RequiresPaymentMethod, "7", "cart");
        match check_intent(&pi, UserId::new(7), OrderKind::Cart) {
            Err(CheckoutError::NotSucceeded(status)) => {
                assert_eq!(status, PaymentStatus::RequiresPaymentMethod);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_free_order_reference_is_not_an_intent_id() {
        let reference = free_order_reference();
        assert!(reference.starts_with("free_"));
        assert!(!crate::services::stripe::is_payment_intent_id(&reference));
        assert_ne!(reference, free_order_reference());
    }

    #[test]
    fn test_new_order_converts_minor_units() {
        let pi = intent(PaymentStatus::Succeeded, "7", "cart");
        let order = new_order(UserId::new(7), &pi, OrderKind::Cart);
        assert_eq!(order.amount, Decimal::new(2500, 2));
        assert_eq!(order.status, "succeeded");
    }
}

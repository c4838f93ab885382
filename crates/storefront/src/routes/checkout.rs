//! Checkout: review, payment intent creation and confirmation.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use modvault_core::OrderId;
use modvault_core::checkout::{CheckoutFlow, CheckoutStep};

use crate::db::CartRepository;
use crate::db::orders::Fulfilment;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::routes::cart::CartView;
use crate::services::checkout::{CartCheckout, CheckoutError, CheckoutService};
use crate::services::stripe::{PaymentIntent, is_payment_intent_id};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub step_number: u8,
    pub empty: bool,
    pub publishable_key: String,
    #[serde(flatten)]
    pub cart: CartView,
}

/// What the browser needs to mount the payment form.
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
}

impl TryFrom<PaymentIntent> for PaymentIntentResponse {
    type Error = AppError;

    fn try_from(intent: PaymentIntent) -> Result<Self> {
        let client_secret = intent
            .client_secret
            .ok_or_else(|| AppError::Internal("payment intent has no client secret".to_owned()))?;
        Ok(Self {
            client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPayment {
    pub payment_intent_id: String,
}

impl ConfirmPayment {
    /// The trimmed intent id, rejected unless it looks like one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for anything but `pi_` plus letters and digits.
    pub fn intent_id(&self) -> Result<&str> {
        let id = self.payment_intent_id.trim();
        if is_payment_intent_id(id) {
            Ok(id)
        } else {
            Err(AppError::BadRequest("payment_intent_id is invalid".to_owned()))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmedOrder {
    pub step: CheckoutStep,
    pub order: Order,
    pub redirect: String,
}

impl From<Fulfilment> for ConfirmedOrder {
    fn from(fulfilment: Fulfilment) -> Self {
        Self {
            step: CheckoutStep::Complete,
            redirect: completion_path(fulfilment.order.id),
            order: fulfilment.order,
        }
    }
}

/// Answer to `POST /api/create-payment-intent`: a payment form to mount, or
/// a finished order when nothing was owed.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckoutStart {
    Payment(PaymentIntentResponse),
    Free(ConfirmedOrder),
}

/// Path the browser lands on after a confirmed order.
#[must_use]
pub fn completion_path(order_id: OrderId) -> String {
    format!("/checkout/complete?order={order_id}")
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutView>> {
    let items = CartRepository::new(state.pool()).items(user.id).await?;
    let flow = CheckoutFlow::for_cart(items.len());

    Ok(Json(CheckoutView {
        step: flow.step(),
        step_number: flow.step().number(),
        empty: items.is_empty(),
        publishable_key: state.config().stripe.publishable_key.clone(),
        cart: CartView::new(items),
    }))
}

/// Start paying for the cart. The amount always comes from the server-side
/// cart, never from the client. A cart that costs nothing is ordered on the
/// spot and answers like a confirmation.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutStart>> {
    let items = CartRepository::new(state.pool()).items(user.id).await?;
    if !CheckoutFlow::for_cart(items.len()).can_initialize_payment() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let started = CheckoutService::new(state.pool(), state.stripe())
        .start_cart(user.id, &items)
        .await?;

    Ok(Json(match started {
        CartCheckout::Payment(intent) => CheckoutStart::Payment(intent.try_into()?),
        CartCheckout::Free(fulfilment) => CheckoutStart::Free(ConfirmedOrder::from(fulfilment)),
    }))
}

/// Confirm a payment. An unfinished payment answers 402 with the provider's
/// status and leaves the cart as it was.
#[instrument(
    skip(state, user, body),
    fields(user_id = %user.id, intent_id = %body.payment_intent_id)
)]
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ConfirmPayment>,
) -> Result<Json<ConfirmedOrder>> {
    let fulfilment = CheckoutService::new(state.pool(), state.stripe())
        .confirm_cart(user.id, body.intent_id()?)
        .await?;

    Ok(Json(ConfirmedOrder::from(fulfilment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_path() {
        assert_eq!(completion_path(OrderId::new(42)), "/checkout/complete?order=42");
    }

    #[test]
    fn test_confirm_rejects_malformed_intent_id() {
        let body = |id: &str| ConfirmPayment {
            payment_intent_id: id.to_owned(),
        };
        assert_eq!(body(" pi_3Mtw8 ").intent_id().ok(), Some("pi_3Mtw8"));
        assert!(matches!(body("").intent_id(), Err(AppError::BadRequest(_))));
        assert!(matches!(body("pi_1/capture").intent_id(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_payment_start_serializes_flat() {
        let start = CheckoutStart::Payment(PaymentIntentResponse {
            client_secret: "pi_1_secret_2".into(),
            payment_intent_id: "pi_1".into(),
            amount: 1499,
            currency: "usd".into(),
        });
        let json = serde_json::to_value(&start).unwrap_or_default();
        assert_eq!(json["payment_intent_id"], "pi_1");
        assert_eq!(json["amount"], 1499);
        assert!(json.get("redirect").is_none());
    }
}

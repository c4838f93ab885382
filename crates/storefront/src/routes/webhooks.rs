//! Stripe webhook receiver.
//!
//! Deliveries that fail verification get a 400. Verified deliveries that can
//! never be fulfilled (no recorded checkout, totals that disagree, unknown
//! tier) are acknowledged so Stripe stops retrying, and reported to Sentry
//! since money was taken. Database failures return 500 so Stripe retries.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, Result};
use crate::services::checkout::{
    CheckoutError, CheckoutService, PAYMENT_SUCCEEDED_EVENT, WebhookOutcome,
};
use crate::services::stripe::PaymentIntent;
use crate::state::AppState;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub fulfilled: bool,
}

#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_owned()))?;

    let event = state.stripe().construct_event(&body, signature).map_err(|e| {
        warn!(error = %e, "Rejected webhook delivery");
        AppError::BadRequest("Invalid webhook signature".to_owned())
    })?;

    if event.event_type != PAYMENT_SUCCEEDED_EVENT {
        info!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
        return Ok(Json(WebhookAck {
            received: true,
            fulfilled: false,
        }));
    }

    let intent: PaymentIntent = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::BadRequest(format!("Malformed payment intent: {e}")))?;

    let outcome = CheckoutService::new(state.pool(), state.stripe())
        .fulfil_from_webhook(&intent)
        .await;

    let fulfilled = match outcome {
        Ok(WebhookOutcome::Fulfilled) => true,
        Ok(WebhookOutcome::AlreadyFulfilled | WebhookOutcome::Ignored) => false,
        Err(
            err @ (CheckoutError::AmountMismatch
            | CheckoutError::EmptyCart
            | CheckoutError::IntentMismatch
            | CheckoutError::TierNotFound),
        ) => {
            let sentry_event_id = sentry::capture_message(
                &format!("Paid intent {} not fulfilled: {err}", intent.id),
                sentry::Level::Error,
            );
            error!(
                event_id = %event.id,
                intent_id = %intent.id,
                error = %err,
                sentry_event_id = %sentry_event_id,
                "Webhook payment not fulfilled"
            );
            false
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(WebhookAck {
        received: true,
        fulfilled,
    }))
}

//! Stripe errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed before Stripe answered.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Stripe answered with something we could not parse.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe rejected the call. The message is Stripe's own.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Webhook signature missing, malformed, stale or wrong.
    #[error("invalid Stripe signature: {0}")]
    InvalidSignature(&'static str),

    /// Webhook body was not a Stripe event.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Caller passed something that is not a payment intent id.
    #[error("invalid payment intent id")]
    InvalidIntentId,

    /// Amount cannot be expressed in minor units.
    #[error("amount out of range")]
    AmountOutOfRange,
}

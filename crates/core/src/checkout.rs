//! Checkout step progression.
//!
//! Checkout is three steps: review the cart, enter payment details, and the
//! confirmation screen. The flow only moves forward on the events below; a
//! failed payment leaves the user on the payment step with the cart intact.

use serde::{Deserialize, Serialize};

/// A step of the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    ReviewCart,
    PaymentInfo,
    Complete,
}

impl CheckoutStep {
    /// One-based position shown in the step indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::ReviewCart => 1,
            Self::PaymentInfo => 2,
            Self::Complete => 3,
        }
    }
}

/// Checkout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckoutFlow {
    step: CheckoutStep,
}

impl CheckoutFlow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: CheckoutStep::ReviewCart,
        }
    }

    /// Rebuild the flow for a cart of `item_count` rows.
    #[must_use]
    pub const fn for_cart(item_count: usize) -> Self {
        let mut flow = Self::new();
        flow.on_cart_loaded(item_count);
        flow
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The cart has been fetched. A non-empty cart advances to payment.
    pub const fn on_cart_loaded(&mut self, item_count: usize) {
        if matches!(self.step, CheckoutStep::ReviewCart) && item_count > 0 {
            self.step = CheckoutStep::PaymentInfo;
        }
    }

    /// The provider reported a successful payment.
    pub const fn on_payment_confirmed(&mut self) {
        if matches!(self.step, CheckoutStep::PaymentInfo) {
            self.step = CheckoutStep::Complete;
        }
    }

    /// The provider rejected the payment. The user stays on the payment step.
    pub const fn on_payment_failed(&mut self) {}

    /// A payment intent may only be created from the payment step.
    #[must_use]
    pub const fn can_initialize_payment(&self) -> bool {
        matches!(self.step, CheckoutStep::PaymentInfo)
    }
}

/// Payment intent status as reported by Stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    #[must_use]
    pub const fn is_succeeded(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Stripe's wire name for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cart_stays_on_review() {
        let flow = CheckoutFlow::for_cart(0);
        assert_eq!(flow.step(), CheckoutStep::ReviewCart);
        assert!(!flow.can_initialize_payment());
    }

    #[test]
    fn test_happy_path() {
        let mut flow = CheckoutFlow::new();
        flow.on_cart_loaded(2);
        assert_eq!(flow.step().number(), 2);
        assert!(flow.can_initialize_payment());
        flow.on_payment_confirmed();
        assert_eq!(flow.step(), CheckoutStep::Complete);
        assert!(!flow.can_initialize_payment());
    }

    #[test]
    fn test_failure_stays_on_payment() {
        let mut flow = CheckoutFlow::for_cart(1);
        flow.on_payment_failed();
        assert_eq!(flow.step(), CheckoutStep::PaymentInfo);
    }

    #[test]
    fn test_confirm_without_payment_step_is_ignored() {
        let mut flow = CheckoutFlow::new();
        flow.on_payment_confirmed();
        assert_eq!(flow.step(), CheckoutStep::ReviewCart);
    }

    #[test]
    fn test_payment_status_wire_format() {
        let status: PaymentStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert!(status.is_succeeded());
        let status: PaymentStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert!(!status.is_succeeded());
        let status: PaymentStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
    }
}

//! Premium subscriptions.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use modvault_core::TierId;
use modvault_core::types::OrderKind;

use crate::db::SubscriptionRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Subscription, SubscriptionTier};
use crate::routes::checkout::{ConfirmPayment, PaymentIntentResponse};
use crate::services::checkout::CheckoutService;
use crate::services::stripe::IntentMetadata;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseSubscription {
    pub tier_id: TierId,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscription {
    pub subscription: Option<Subscription>,
}

#[instrument(skip(state))]
pub async fn tiers(State(state): State<AppState>) -> Result<Json<Vec<SubscriptionTier>>> {
    let tiers = SubscriptionRepository::new(state.pool()).active_tiers().await?;
    Ok(Json(tiers))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn purchase(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<PurchaseSubscription>,
) -> Result<Json<PaymentIntentResponse>> {
    let tier = SubscriptionRepository::new(state.pool())
        .get_tier(body.tier_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription tier".to_owned()))?;

    let user_id = user.id.to_string();
    let tier_id = tier.id.to_string();
    let intent = state
        .stripe()
        .create_payment_intent(
            tier.price,
            IntentMetadata {
                user_id: &user_id,
                kind: OrderKind::Subscription,
                tier_id: Some(&tier_id),
            },
        )
        .await?;

    info!(intent_id = %intent.id, tier = %tier.name, "Subscription checkout started");
    Ok(Json(intent.try_into()?))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ConfirmPayment>,
) -> Result<Json<Subscription>> {
    let subscription = CheckoutService::new(state.pool(), state.stripe())
        .confirm_subscription(user.id, body.intent_id()?)
        .await?;
    Ok(Json(subscription))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn current(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CurrentSubscription>> {
    let subscription = SubscriptionRepository::new(state.pool()).current(user.id).await?;
    Ok(Json(CurrentSubscription { subscription }))
}

/// Cancel at the end of the paid period; access continues until then.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Subscription>> {
    let subscription = SubscriptionRepository::new(state.pool())
        .cancel(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Active subscription".to_owned()))?;
    info!(subscription_id = %subscription.id, "Subscription canceled");
    Ok(Json(subscription))
}

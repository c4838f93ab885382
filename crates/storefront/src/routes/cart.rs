//! Cart route handlers.
//!
//! Carts are server-side rows, one per mod. Totals and deals are recomputed
//! on every read so they always reflect current catalog prices.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use modvault_core::ModId;
use modvault_core::deals::{Deal, DealContext, active_deals};
use modvault_core::pricing::{CartItem, CartSummary, format_usd, summarize};

use crate::db::{CartRepository, ModRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    pub total_display: String,
    pub deals: Vec<&'static Deal>,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartItem>) -> Self {
        let summary = summarize(&items);
        let deals = active_deals(&DealContext::from_items(&items));
        Self {
            total_display: format_usd(summary.total),
            items,
            summary,
            deals,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub mod_id: ModId,
}

/// `added` is false when the mod was already in the cart.
#[derive(Debug, Serialize)]
pub struct CartAddition {
    pub added: bool,
    pub cart: CartView,
}

#[derive(Debug, Serialize)]
pub struct CartRemoval {
    pub removed: bool,
    pub cart: CartView,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let items = CartRepository::new(state.pool()).items(user.id).await?;
    Ok(Json(CartView::new(items)))
}

/// Add a mod. Adding one already in the cart changes nothing.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartAddition>> {
    let pool = state.pool();

    if ModRepository::new(pool).get(body.mod_id).await?.is_none() {
        return Err(AppError::NotFound("Mod".to_owned()));
    }
    if OrderRepository::new(pool).owns(user.id, body.mod_id).await? {
        return Err(AppError::Conflict("You already own this mod".to_owned()));
    }

    let carts = CartRepository::new(pool);
    let added = carts.add(user.id, body.mod_id).await?;
    let cart = CartView::new(carts.items(user.id).await?);
    Ok(Json(CartAddition { added, cart }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(mod_id): Path<i32>,
) -> Result<Json<CartRemoval>> {
    let carts = CartRepository::new(state.pool());
    let removed = carts.remove(user.id, ModId::new(mod_id)).await?;
    let cart = CartView::new(carts.items(user.id).await?);
    Ok(Json(CartRemoval { removed, cart }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartRemoval>> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(CartRemoval {
        removed: removed > 0,
        cart: CartView::new(Vec::new()),
    }))
}

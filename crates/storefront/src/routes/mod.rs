//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Database readiness
//!
//! # Auth
//! POST   /api/auth/register                    - Create account (rate limited)
//! POST   /api/auth/login                       - Log in (rate limited)
//! POST   /api/auth/logout                      - Log out
//! GET    /api/auth/me                          - Current user
//!
//! # Catalog
//! GET    /api/mods                             - Listing (filter, sort, page)
//! GET    /api/mods/{id}                        - Detail
//!
//! # Cart and checkout (requires auth)
//! GET    /api/cart                             - Items, summary, deals
//! POST   /api/cart                             - Add a mod
//! DELETE /api/cart                             - Clear
//! DELETE /api/cart/{mod_id}                    - Remove a mod
//! GET    /api/checkout                         - Current step and summary
//! POST   /api/create-payment-intent            - Start payment
//! POST   /api/checkout/confirm                 - Record a successful payment
//! POST   /api/webhooks/stripe                  - Stripe events (signed)
//!
//! # Subscriptions
//! GET    /api/subscription-tiers               - Tiers on sale
//! POST   /api/purchase-subscription            - Start payment for a tier
//! POST   /api/purchase-subscription/confirm    - Activate after payment
//! GET    /api/subscription                     - Current subscription
//! POST   /api/subscription/cancel              - Cancel at period end
//!
//! # Locker (requires auth)
//! GET    /api/locker                           - Owned mods
//! GET    /api/locker/{mod_id}/download         - Download details
//!
//! # Community
//! GET    /api/forum/threads                    - Thread listing
//! POST   /api/forum/threads                    - New thread
//! GET    /api/forum/threads/{id}               - Thread with posts
//! POST   /api/forum/threads/{id}/posts         - Reply
//! GET    /api/support-tickets                  - Own tickets
//! POST   /api/support-tickets                  - Open a ticket
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod forum;
pub mod health;
pub mod locker;
pub mod mods;
pub mod subscriptions;
pub mod tickets;
pub mod webhooks;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Login and registration, behind the auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/{mod_id}", delete(cart::remove))
}

pub fn forum_routes() -> Router<AppState> {
    Router::new()
        .route("/threads", get(forum::index).post(forum::create))
        .route("/threads/{id}", get(forum::show))
        .route("/threads/{id}/posts", post(forum::reply))
}

/// Every `/api` route.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/mods", get(mods::index))
        .route("/mods/{id}", get(mods::show))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show))
        .route("/create-payment-intent", post(checkout::create_payment_intent))
        .route("/checkout/confirm", post(checkout::confirm))
        .route("/webhooks/stripe", post(webhooks::stripe))
        .route("/subscription-tiers", get(subscriptions::tiers))
        .route("/purchase-subscription", post(subscriptions::purchase))
        .route("/purchase-subscription/confirm", post(subscriptions::confirm))
        .route("/subscription", get(subscriptions::current))
        .route("/subscription/cancel", post(subscriptions::cancel))
        .route("/locker", get(locker::index))
        .route("/locker/{mod_id}/download", get(locker::download))
        .nest("/forum", forum_routes())
        .route("/support-tickets", get(tickets::index).post(tickets::create))
}

/// Create the full router (without state or outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

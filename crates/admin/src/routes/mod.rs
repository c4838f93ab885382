//! HTTP route handlers for the admin back office.
//!
//! Every `/api/admin` route needs an admin session; each handler then checks
//! its own permission.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                  - Liveness
//! GET    /health/ready                            - Database readiness
//!
//! POST   /api/admin/auth/login                    - Sign in
//! POST   /api/admin/auth/logout                   - Sign out
//! GET    /api/admin/auth/me                       - Current admin, refreshed
//! GET    /api/admin/menu                          - Navigation for this admin
//! GET    /api/admin/permissions                   - Permission catalog
//!
//! GET    /api/admin/users                         - view_users
//! GET    /api/admin/users/{id}                    - view_users
//! PATCH  /api/admin/users/{id}                    - ban_users / manage_users
//! DELETE /api/admin/users/{id}                    - delete_users
//! PUT    /api/admin/users/{id}/roles              - manage_roles
//!
//! GET    /api/admin/roles                         - view_roles
//! POST   /api/admin/roles                         - manage_roles
//! GET    /api/admin/roles/{id}                    - view_roles
//! PATCH  /api/admin/roles/{id}                    - manage_roles
//! DELETE /api/admin/roles/{id}                    - manage_roles
//!
//! GET    /api/admin/mods                          - view_mods
//! POST   /api/admin/mods                          - manage_mods
//! GET    /api/admin/mods/{id}                     - view_mods
//! PATCH  /api/admin/mods/{id}                     - manage_mods
//! DELETE /api/admin/mods/{id}                     - manage_mods
//!
//! GET    /api/admin/support-tickets               - view_tickets
//! GET    /api/admin/support-tickets/{id}          - view_tickets
//! PATCH  /api/admin/support-tickets/{id}          - manage_tickets
//! DELETE /api/admin/support-tickets/{id}          - manage_tickets
//! POST   /api/admin/support-tickets/{id}/replies  - manage_tickets
//!
//! GET    /api/admin/settings                      - view_settings
//! PUT    /api/admin/settings                      - manage_system
//! GET    /api/admin/analytics                     - view_analytics
//! ```

pub mod analytics;
pub mod auth;
pub mod health;
pub mod menu;
pub mod mods;
pub mod roles;
pub mod settings;
pub mod tickets;
pub mod users;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Every `/api/admin` route.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(menu::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(mods::router())
        .merge(tickets::router())
        .merge(settings::router())
        .merge(analytics::router())
}

/// Create the full router (without state or outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/admin", admin_routes())
}

//! Navigation and the permission catalog.

use std::collections::BTreeMap;

use axum::{Json, Router, routing::get};

use modvault_core::permissions::{
    MenuItem, Permission, admin_menu, filter_menu, permissions_by_category,
};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", get(menu))
        .route("/permissions", get(permissions))
}

/// The admin navigation pruned to what this admin can reach.
async fn menu(RequireAdmin(admin): RequireAdmin) -> Json<Vec<MenuItem>> {
    Json(filter_menu(&admin_menu(), &admin.access))
}

async fn permissions(
    admin: RequireAdmin,
) -> Result<Json<BTreeMap<&'static str, Vec<&'static Permission>>>> {
    admin.require("view_roles")?;
    Ok(Json(permissions_by_category()))
}

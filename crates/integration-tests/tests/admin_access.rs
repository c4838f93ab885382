//! Admin router tests against a real database.
//!
//! Access is read from the database on every request, so these need
//! `TEST_DATABASE_URL`. Run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower_sessions::MemoryStore;

use modvault_integration_tests::{
    admin_app_with, admin_session, assign_role, database, insert_role, insert_user, request,
    send, session_exists,
};

/// A staff account holding exactly `permissions` through one custom role,
/// signed in. Returns the user id and the session cookie.
async fn staff(pool: &PgPool, store: &MemoryStore, permissions: &[&str]) -> (i32, String) {
    let (user_id, email) = insert_user(pool, false).await;
    let role_id = insert_role(pool, permissions).await;
    assign_role(pool, user_id, role_id).await;
    (user_id, admin_session(store, user_id, &email).await)
}

fn ids(items: &Value) -> Vec<&str> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Per-request access
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_banned_admin_session_is_revoked() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (user_id, cookie) = staff(&pool, &store, &["view_users"]).await;

    let app = admin_app_with(store.clone(), pool.clone());
    let (status, _) = send(app, request("GET", "/api/admin/menu", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("UPDATE users SET is_banned = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let app = admin_app_with(store.clone(), pool);
    let (status, body) = send(app, request("GET", "/api/admin/users", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Admin access revoked");
    assert!(!session_exists(&store, &cookie).await);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_removed_role_revokes_access() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (user_id, cookie) = staff(&pool, &store, &["view_users"]).await;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let app = admin_app_with(store.clone(), pool);
    let (status, _) = send(app, request("GET", "/api/admin/users", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!session_exists(&store, &cookie).await);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_narrowed_role_applies_immediately() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (user_id, cookie) = staff(&pool, &store, &["view_users", "view_tickets"]).await;

    sqlx::query(
        "DELETE FROM role_permissions
         WHERE permission_id = 'view_users'
           AND role_id IN (SELECT role_id FROM user_roles WHERE user_id = $1)",
    )
    .bind(user_id)
    .execute(&pool)
    .await
    .unwrap();

    let app = admin_app_with(store.clone(), pool);
    let (status, body) = send(app, request("GET", "/api/admin/users", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing permission: view_users");
    assert!(session_exists(&store, &cookie).await);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_me_reports_fresh_permissions() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["view_tickets"]).await;

    let app = admin_app_with(store, pool);
    let (status, body) = send(app, request("GET", "/api/admin/auth/me", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"], json!(["view_tickets"]));
    assert_eq!(body["is_admin"], false);
}

// =============================================================================
// Permission checks
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_menu_is_pruned_to_permissions() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["view_tickets"]).await;
    let app = admin_app_with(store, pool);

    let (status, body) = send(app, request("GET", "/api/admin/menu", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["dashboard", "support"]);
    assert_eq!(ids(&body[1]["children"]), vec!["support-tickets"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_missing_permission_is_forbidden() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["view_tickets"]).await;
    let app = admin_app_with(store, pool);

    let (status, body) = send(app, request("GET", "/api/admin/users", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing permission: view_users");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_permission_catalog_grouped_by_category() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["view_roles"]).await;
    let app = admin_app_with(store, pool);

    let req = request("GET", "/api/admin/permissions", Some(&cookie), None);
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["tickets"]), vec!["view_tickets", "manage_tickets"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cannot_ban_yourself() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (user_id, cookie) = staff(&pool, &store, &["ban_users"]).await;
    let app = admin_app_with(store, pool);

    let body = json!({ "is_banned": true });
    let uri = format!("/api/admin/users/{user_id}");
    let (status, body) = send(app, request("PATCH", &uri, Some(&cookie), Some(&body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot ban yourself");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_admin_flag_needs_full_admin() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["manage_users"]).await;
    let (target, _) = insert_user(&pool, false).await;
    let app = admin_app_with(store, pool);

    let body = json!({ "is_admin": true });
    let uri = format!("/api/admin/users/{target}");
    let (status, _) = send(app, request("PATCH", &uri, Some(&cookie), Some(&body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_settings_need_manage_system_then_validate() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, viewer) = staff(&pool, &store, &["view_settings"]).await;
    let (_, manager) = staff(&pool, &store, &["manage_system"]).await;
    let body = json!({ "site_name": "Modvault", "support_email": "nope" });

    let app = admin_app_with(store.clone(), pool.clone());
    let req = request("PUT", "/api/admin/settings", Some(&viewer), Some(&body));
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let app = admin_app_with(store, pool);
    let req = request("PUT", "/api/admin/settings", Some(&manager), Some(&body));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "support_email");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_blank_staff_reply_is_rejected() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["manage_tickets"]).await;
    let app = admin_app_with(store, pool);

    let body = json!({ "body": "   " });
    let uri = "/api/admin/support-tickets/1/replies";
    let (status, _) = send(app, request("POST", uri, Some(&cookie), Some(&body))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// Granting permissions
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_role_with_unknown_permission_is_rejected() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["manage_roles"]).await;
    let app = admin_app_with(store, pool);

    let body = json!({ "name": "Helpers", "permissions": ["view_tickets", "launch_rockets"] });
    let req = request("POST", "/api/admin/roles", Some(&cookie), Some(&body));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "permissions");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cannot_create_role_with_unheld_permission() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["manage_roles", "view_tickets"]).await;
    let app = admin_app_with(store, pool);

    let name = modvault_integration_tests::unique("helpers");
    let body = json!({ "name": name, "permissions": ["view_tickets", "manage_system"] });
    let req = request("POST", "/api/admin/roles", Some(&cookie), Some(&body));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot grant permissions you do not hold: manage_system");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cannot_escalate_own_role() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (user_id, email) = insert_user(&pool, false).await;
    let role_id = insert_role(&pool, &["manage_roles", "view_roles"]).await;
    assign_role(&pool, user_id, role_id).await;
    let cookie = admin_session(&store, user_id, &email).await;

    let body = json!({
        "name": modvault_integration_tests::unique("self"),
        "permissions": ["manage_roles", "view_roles", "manage_system", "delete_users"],
    });
    let uri = format!("/api/admin/roles/{role_id}");
    let app = admin_app_with(store.clone(), pool.clone());
    let (status, body) = send(app, request("PATCH", &uri, Some(&cookie), Some(&body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Cannot grant permissions you do not hold: delete_users, manage_system"
    );

    let held: Vec<String> = sqlx::query_scalar(
        "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
    )
    .bind(role_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(held, vec!["manage_roles", "view_roles"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cannot_assign_role_with_unheld_permissions() {
    let pool = database().await;
    let store = MemoryStore::default();
    let (_, cookie) = staff(&pool, &store, &["manage_roles"]).await;
    let (target, _) = insert_user(&pool, false).await;
    let powerful = insert_role(&pool, &["manage_system"]).await;
    let app = admin_app_with(store, pool);

    let body = json!({ "role_ids": [powerful] });
    let uri = format!("/api/admin/users/{target}/roles");
    let (status, _) = send(app, request("PUT", &uri, Some(&cookie), Some(&body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

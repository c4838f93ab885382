//! Admin router tests that never reach the database.
//!
//! Anything past the session check re-reads the account, so permission and
//! validation tests live in `admin_access.rs`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tower_sessions::MemoryStore;

use modvault_integration_tests::{
    ADMIN_COOKIE, STOREFRONT_COOKIE, admin_app, request, seed_session, send,
};

/// A non-flag admin holding only `permissions`, with user id 10.
async fn staff(store: &MemoryStore, permissions: &[&str]) -> String {
    seed_session(
        store,
        ADMIN_COOKIE,
        "current_admin",
        json!({
            "id": 10,
            "username": "staffer",
            "email": "staff@modvault.gg",
            "is_admin": false,
            "permissions": permissions,
        }),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = admin_app(MemoryStore::default());
    let (status, body) = send(app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_admin_routes_require_sign_in() {
    let uris = ["/api/admin/users", "/api/admin/menu", "/api/admin/settings", "/api/admin/auth/me"];
    for uri in uris {
        let app = admin_app(MemoryStore::default());
        let (status, body) = send(app, request("GET", uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["redirect"], "/sign-in", "{uri}");
    }
}

#[tokio::test]
async fn test_storefront_cookie_does_not_open_admin() {
    let store = MemoryStore::default();
    let cookie = seed_session(
        &store,
        STOREFRONT_COOKIE,
        "current_user",
        json!({ "id": 7, "username": "drifter", "email": "drifter@modvault.gg" }),
    )
    .await;
    let app = admin_app(store);
    let (status, _) = send(app, request("GET", "/api/admin/menu", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_alone_is_not_trusted() {
    let store = MemoryStore::default();
    let cookie = staff(&store, &["view_users"]).await;
    let app = admin_app(store);

    let (status, body) = send(app, request("GET", "/api/admin/users", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let store = MemoryStore::default();
    let cookie = staff(&store, &["view_tickets"]).await;

    let app = admin_app(store.clone());
    let req = request("POST", "/api/admin/auth/logout", Some(&cookie), None);
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = admin_app(store);
    let (status, _) = send(app, request("GET", "/api/admin/menu", Some(&cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

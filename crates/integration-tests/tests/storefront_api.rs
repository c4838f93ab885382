//! Storefront router tests that never touch the database.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

use modvault_integration_tests::{request, seed_session, send, storefront_app, stripe_signature};

const COOKIE: &str = "mv_session";

async fn signed_in(store: &MemoryStore) -> String {
    seed_session(
        store,
        COOKIE,
        "current_user",
        json!({ "id": 7, "username": "drifter", "email": "drifter@modvault.gg" }),
    )
    .await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_is_ok_without_database() {
    let app = storefront_app(MemoryStore::default());
    let (status, body) = send(app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = storefront_app(MemoryStore::default());
    let (status, _) = send(app, request("GET", "/health/ready", None, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_cart_requires_sign_in() {
    let app = storefront_app(MemoryStore::default());
    let (status, body) = send(app, request("GET", "/api/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Sign in required");
    assert_eq!(body["redirect"], "/sign-in");
}

#[tokio::test]
async fn test_unknown_session_cookie_is_anonymous() {
    let app = storefront_app(MemoryStore::default());
    let cookie = "mv_session=AAAAAAAAAAAAAAAAAAAAAA";
    let (status, _) = send(app, request("GET", "/api/locker", Some(cookie), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = storefront_app(MemoryStore::default());
    let body = json!({ "username": "", "email": "not-an-email", "password": "" });
    let (status, body) = send(app, request("POST", "/api/auth/register", None, Some(&body))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation failed");
    assert!(!body["fields"].as_array().unwrap().is_empty());
}

// =============================================================================
// Validation behind sign-in
// =============================================================================

#[tokio::test]
async fn test_ticket_with_blank_title_is_rejected() {
    let store = MemoryStore::default();
    let cookie = signed_in(&store).await;
    let app = storefront_app(store);

    let body = json!({
        "title": "",
        "description": "My download link is broken",
        "category": "mod_issue",
    });
    let req = request("POST", "/api/support-tickets", Some(&cookie), Some(&body));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "title"));
}

#[tokio::test]
async fn test_forum_thread_needs_known_category() {
    let store = MemoryStore::default();
    let cookie = signed_in(&store).await;
    let app = storefront_app(store);

    let body = json!({
        "title": "Best drift setups?",
        "body": "Share yours",
        "category": "nonsense",
    });
    let req = request("POST", "/api/forum/threads", Some(&cookie), Some(&body));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "category"));
}

// =============================================================================
// Stripe webhooks
// =============================================================================

fn succeeded_without_intent() -> Value {
    json!({ "id": "evt_1", "type": "payment_intent.succeeded", "data": { "object": {} } })
}

#[tokio::test]
async fn test_webhook_without_signature_is_rejected() {
    let app = storefront_app(MemoryStore::default());
    let payload = succeeded_without_intent();
    let req = request("POST", "/api/webhooks/stripe", None, Some(&payload));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing Stripe-Signature header");
}

#[tokio::test]
async fn test_webhook_with_forged_signature_is_rejected() {
    let app = storefront_app(MemoryStore::default());
    let payload = succeeded_without_intent();
    let mut req = request("POST", "/api/webhooks/stripe", None, Some(&payload));
    req.headers_mut().insert(
        "stripe-signature",
        "t=1700000000,v1=deadbeef".parse().unwrap(),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid webhook signature");
}

#[tokio::test]
async fn test_webhook_ignores_other_event_types() {
    let app = storefront_app(MemoryStore::default());
    let payload = json!({
        "id": "evt_2",
        "type": "customer.created",
        "data": { "object": { "id": "cus_1" } },
    });
    let signature = stripe_signature(&payload.to_string());
    let mut req = request("POST", "/api/webhooks/stripe", None, Some(&payload));
    req.headers_mut()
        .insert("stripe-signature", signature.parse().unwrap());
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true, "fulfilled": false }));
}

// =============================================================================
// Checkout input
// =============================================================================

#[tokio::test]
async fn test_confirm_rejects_malformed_intent_id() {
    let store = MemoryStore::default();
    let cookie = signed_in(&store).await;

    for id in ["", "ch_123", "pi_1/../../v1/charges", "pi_1?expand[]=customer"] {
        let app = storefront_app(store.clone());
        let body = json!({ "payment_intent_id": id });
        let req = request("POST", "/api/checkout/confirm", Some(&cookie), Some(&body));
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{id}");
        assert_eq!(body["error"], "payment_intent_id is invalid", "{id}");
    }
}

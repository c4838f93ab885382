//! Cart and checkout against a real database and a mocked payment provider.
//!
//! Needs `TEST_DATABASE_URL`. Run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower_sessions::MemoryStore;

use modvault_integration_tests::{
    FakeStripe, cart_intent, cart_mod_ids, database, insert_mod, insert_user, order_count,
    payment_succeeded_event, purchased_mod_ids, request, send, storefront_app_with,
    storefront_session, stripe_signature, with_status,
};

struct Shop {
    pool: PgPool,
    store: MemoryStore,
    stripe: FakeStripe,
    user_id: i32,
    cookie: String,
}

impl Shop {
    async fn open() -> Self {
        let pool = database().await;
        let store = MemoryStore::default();
        let stripe = FakeStripe::start().await;
        let (user_id, email) = insert_user(&pool, false).await;
        let cookie = storefront_session(&store, user_id, &email).await;
        Self {
            pool,
            store,
            stripe,
            user_id,
            cookie,
        }
    }

    fn app(&self) -> Router {
        storefront_app_with(self.store.clone(), self.pool.clone(), &self.stripe.base_url())
    }

    async fn call(&self, method: &str, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
        send(self.app(), request(method, uri, Some(&self.cookie), body)).await
    }

    async fn add(&self, mod_id: i32) -> (StatusCode, Value) {
        self.call("POST", "/api/cart", Some(&json!({ "mod_id": mod_id }))).await
    }

    async fn start_checkout(&self) -> (StatusCode, Value) {
        self.call("POST", "/api/create-payment-intent", None).await
    }

    async fn confirm(&self, intent: &Value) -> (StatusCode, Value) {
        let body = json!({ "payment_intent_id": intent["id"] });
        self.call("POST", "/api/checkout/confirm", Some(&body)).await
    }

    async fn deliver_webhook(&self, intent: &Value) -> (StatusCode, Value) {
        let payload = payment_succeeded_event(intent);
        let mut req = request("POST", "/api/webhooks/stripe", None, None);
        *req.body_mut() = payload.clone().into();
        req.headers_mut()
            .insert("stripe-signature", stripe_signature(&payload).parse().unwrap());
        send(self.app(), req).await
    }
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_adding_twice_leaves_one_row() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "4.99").await;

    let (status, body) = shop.add(mod_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], true);

    let (status, body) = shop.add(mod_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], false);
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart_mod_ids(&shop.pool, shop.user_id).await, vec![mod_id]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_owned_mod_cannot_be_added() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "4.99").await;
    sqlx::query("INSERT INTO purchases (user_id, mod_id, price_paid) VALUES ($1, $2, 4.99)")
        .bind(shop.user_id)
        .bind(mod_id)
        .execute(&shop.pool)
        .await
        .unwrap();

    let (status, body) = shop.add(mod_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You already own this mod");
    assert!(cart_mod_ids(&shop.pool, shop.user_id).await.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_removing_reports_whether_anything_changed() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "4.99").await;
    shop.add(mod_id).await;

    let uri = format!("/api/cart/{mod_id}");
    let (_, body) = shop.call("DELETE", &uri, None).await;
    assert_eq!(body["removed"], true);
    let (_, body) = shop.call("DELETE", &uri, None).await;
    assert_eq!(body["removed"], false);
}

// =============================================================================
// Starting checkout
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_empty_cart_never_reaches_stripe() {
    let shop = Shop::open().await;
    let create = shop.stripe.on_create(0, &cart_intent(shop.user_id, 0, "requires_payment_method"));

    let (status, body) = shop.start_checkout().await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");
    assert_eq!(create.hits(), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_total_below_card_minimum_is_rejected() {
    let shop = Shop::open().await;
    shop.add(insert_mod(&shop.pool, "0.25").await).await;
    let intent = cart_intent(shop.user_id, 25, "requires_payment_method");
    let create = shop.stripe.on_create(25, &intent);

    let (status, _) = shop.start_checkout().await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(create.hits(), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_free_cart_is_ordered_without_stripe() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "0.00").await;
    shop.add(mod_id).await;
    let create = shop.stripe.on_create(0, &cart_intent(shop.user_id, 0, "requires_payment_method"));

    let (status, body) = shop.start_checkout().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "complete");
    assert!(body["order"]["payment_intent_id"].as_str().unwrap().starts_with("free_"));
    assert_eq!(create.hits(), 0);

    assert_eq!(purchased_mod_ids(&shop.pool, shop.user_id).await, vec![mod_id]);
    assert!(cart_mod_ids(&shop.pool, shop.user_id).await.is_empty());

    let (status, body) = shop.call("GET", "/api/locker", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mods"][0]["mod_id"], mod_id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_intent_amount_comes_from_cart() {
    let shop = Shop::open().await;
    shop.add(insert_mod(&shop.pool, "4.99").await).await;
    shop.add(insert_mod(&shop.pool, "10.00").await).await;
    let intent = cart_intent(shop.user_id, 1499, "requires_payment_method");
    let create = shop.stripe.on_create(1499, &intent);

    let (status, body) = shop.start_checkout().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_intent_id"], intent["id"]);
    assert_eq!(body["client_secret"], intent["client_secret"]);
    assert_eq!(body["amount"], 1499);
    create.assert();
}

// =============================================================================
// Confirmation and fulfilment
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_unpaid_confirm_leaves_cart_alone() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "4.99").await;
    shop.add(mod_id).await;
    let intent = cart_intent(shop.user_id, 499, "requires_payment_method");
    let _create = shop.stripe.on_create(499, &intent);
    let _retrieve = shop.stripe.on_retrieve(&intent);
    shop.start_checkout().await;

    let (status, body) = shop.confirm(&intent).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["status"], "requires_payment_method");

    assert_eq!(cart_mod_ids(&shop.pool, shop.user_id).await, vec![mod_id]);
    assert!(purchased_mod_ids(&shop.pool, shop.user_id).await.is_empty());
    assert_eq!(order_count(&shop.pool, shop.user_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_confirm_then_webhook_fulfils_once() {
    let shop = Shop::open().await;
    let mod_id = insert_mod(&shop.pool, "4.99").await;
    shop.add(mod_id).await;
    let intent = cart_intent(shop.user_id, 499, "requires_payment_method");
    let _create = shop.stripe.on_create(499, &intent);
    shop.start_checkout().await;
    let paid = with_status(&intent, "succeeded");
    let _retrieve = shop.stripe.on_retrieve(&paid);

    let (status, body) = shop.confirm(&paid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["payment_intent_id"], paid["id"]);
    let order_id = body["order"]["id"].clone();

    let (status, body) = shop.deliver_webhook(&paid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(body["fulfilled"], false);

    let (status, body) = shop.confirm(&paid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["id"], order_id);

    assert_eq!(order_count(&shop.pool, shop.user_id).await, 1);
    assert_eq!(purchased_mod_ids(&shop.pool, shop.user_id).await, vec![mod_id]);
    assert!(cart_mod_ids(&shop.pool, shop.user_id).await.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_webhook_then_confirm_fulfils_once() {
    let shop = Shop::open().await;
    shop.add(insert_mod(&shop.pool, "4.99").await).await;
    let intent = cart_intent(shop.user_id, 499, "requires_payment_method");
    let _create = shop.stripe.on_create(499, &intent);
    shop.start_checkout().await;
    let paid = with_status(&intent, "succeeded");
    let _retrieve = shop.stripe.on_retrieve(&paid);

    let (_, body) = shop.deliver_webhook(&paid).await;
    assert_eq!(body["fulfilled"], true);
    let (_, body) = shop.deliver_webhook(&paid).await;
    assert_eq!(body["fulfilled"], false);

    let (status, _) = shop.confirm(&paid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_count(&shop.pool, shop.user_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_cart_edited_after_payment_start_does_not_change_purchase() {
    let shop = Shop::open().await;
    let paid_for = insert_mod(&shop.pool, "4.99").await;
    let added_later = insert_mod(&shop.pool, "19.99").await;
    shop.add(paid_for).await;
    let intent = cart_intent(shop.user_id, 499, "requires_payment_method");
    let _create = shop.stripe.on_create(499, &intent);
    shop.start_checkout().await;

    shop.add(added_later).await;
    shop.call("DELETE", &format!("/api/cart/{paid_for}"), None).await;
    let paid = with_status(&intent, "succeeded");
    let _retrieve = shop.stripe.on_retrieve(&paid);

    let (status, _) = shop.confirm(&paid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purchased_mod_ids(&shop.pool, shop.user_id).await, vec![paid_for]);
    assert_eq!(cart_mod_ids(&shop.pool, shop.user_id).await, vec![added_later]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at TEST_DATABASE_URL"]
async fn test_someone_elses_intent_is_refused() {
    let shop = Shop::open().await;
    shop.add(insert_mod(&shop.pool, "4.99").await).await;
    let intent = cart_intent(shop.user_id, 499, "requires_payment_method");
    let _create = shop.stripe.on_create(499, &intent);
    shop.start_checkout().await;
    let paid = with_status(&intent, "succeeded");
    let _retrieve = shop.stripe.on_retrieve(&paid);

    let (other_id, email) = insert_user(&shop.pool, false).await;
    let cookie = storefront_session(&shop.store, other_id, &email).await;
    let body = json!({ "payment_intent_id": paid["id"] });
    let req = request("POST", "/api/checkout/confirm", Some(&cookie), Some(&body));
    let (status, _) = send(shop.app(), req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(order_count(&shop.pool, other_id).await, 0);
}

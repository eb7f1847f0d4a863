//! Online payment through the signed gateway redirect

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use shared::OrderId;
use storefront::config::DEV_PAYMENT_SECRET;
use storefront::{PaymentCallback, PaymentGateway, RealPaymentGateway};

use common::fixtures::seed_catalog;
use common::helpers::*;

fn gateway() -> RealPaymentGateway {
    RealPaymentGateway::new(
        DEV_PAYMENT_SECRET,
        "https://sandbox.payments.example/checkout",
        "http://127.0.0.1:8080/api/payment/callback",
    )
    .unwrap()
}

/// Callback query string for `order`, signed unless `signature` is given
fn callback_uri(order: &Value, code: &str, signature: Option<&str>) -> String {
    let mut callback = PaymentCallback {
        order_id: OrderId(order["id"].as_u64().unwrap()),
        amount: order["total"].as_u64().unwrap(),
        txn_ref: order["txn_ref"].as_str().unwrap().to_string(),
        code: code.to_string(),
        signature: String::new(),
    };
    callback.signature = signature.map_or_else(|| gateway().sign(&callback), str::to_string);
    format!(
        "/api/payment/callback?order_id={}&amount={}&txn_ref={}&code={}&signature={}",
        callback.order_id, callback.amount, callback.txn_ref, callback.code, callback.signature
    )
}

#[tokio::test]
async fn test_online_checkout_returns_signed_redirect() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut customer = customer(&app, "ana@shop.test").await;

    let placed = place_order(&mut customer, catalog.green_tea, 2, "online").await;
    assert_eq!(placed.status, StatusCode::CREATED);
    let order = &placed.data()["order"];
    assert!(order["txn_ref"].is_string());

    let url = placed.data()["payment_url"].as_str().unwrap();
    assert!(url.starts_with("https://sandbox.payments.example/checkout?"));
    assert!(url.contains(&format!("order_id={}", order["id"])));
    assert!(url.contains("amount=1200"));
    assert!(url.contains("signature="));
}

#[tokio::test]
async fn test_successful_payment_marks_paid_once() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut customer = customer(&app, "ana@shop.test").await;

    let placed = place_order(&mut customer, catalog.green_tea, 2, "online").await;
    let order = placed.data()["order"].clone();
    let order_id = order["id"].as_u64().unwrap();

    // Unpaid online orders cannot be confirmed
    let early = admin.post_empty(&format!("/api/admin/orders/{order_id}/confirm")).await;
    assert_eq!(early.status, StatusCode::PAYMENT_REQUIRED);

    let mut gateway_redirect = Client::new(&app);
    let paid = gateway_redirect.get(&callback_uri(&order, "00", None)).await;
    assert_eq!(paid.status, StatusCode::OK, "{}", paid.body);
    assert_eq!(paid.data()["payment_status"], "paid");
    assert_eq!(paid.data()["status"], "pending");

    let replay = gateway_redirect.get(&callback_uri(&order, "00", None)).await;
    assert_eq!(replay.status, StatusCode::OK);
    let history = replay.data()["history"].as_array().unwrap();
    assert_eq!(history.len(), 2, "replayed callback must not add history");

    let confirmed = admin.post_empty(&format!("/api/admin/orders/{order_id}/confirm")).await;
    assert_eq!(confirmed.data()["status"], "confirmed");
}

#[tokio::test]
async fn test_tampered_callback_changes_nothing() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut customer = customer(&app, "ana@shop.test").await;

    let placed = place_order(&mut customer, catalog.green_tea, 2, "online").await;
    let order = placed.data()["order"].clone();
    let order_id = order["id"].as_u64().unwrap();

    let mut gateway_redirect = Client::new(&app);
    let forged = gateway_redirect.get(&callback_uri(&order, "00", Some("deadbeef"))).await;
    assert_eq!(forged.status, StatusCode::PAYMENT_REQUIRED);

    // Valid signature over the wrong amount
    let mut cheap = order.clone();
    cheap["total"] = json!(1);
    let underpaid = gateway_redirect.get(&callback_uri(&cheap, "00", None)).await;
    assert_eq!(underpaid.status, StatusCode::PAYMENT_REQUIRED);

    let current = customer.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(current.data()["payment_status"], "unpaid");
}

#[tokio::test]
async fn test_failed_payment_cancels_and_restocks() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut customer = customer(&app, "ana@shop.test").await;

    let placed = place_order(&mut customer, catalog.espresso, 2, "online").await;
    let order = placed.data()["order"].clone();
    assert_eq!(stock_of(&mut admin, catalog.espresso).await, 1);

    let mut gateway_redirect = Client::new(&app);
    let declined = gateway_redirect.get(&callback_uri(&order, "24", None)).await;
    assert_eq!(declined.status, StatusCode::OK);
    assert_eq!(declined.data()["status"], "cancelled");
    assert_eq!(declined.data()["payment_status"], "failed");
    assert_eq!(stock_of(&mut admin, catalog.espresso).await, 3);

    // A later success cannot revive it
    let late = gateway_redirect.get(&callback_uri(&order, "00", None)).await;
    assert_eq!(late.status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_cancelling_paid_order_refunds() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut customer = customer(&app, "ana@shop.test").await;

    let placed = place_order(&mut customer, catalog.green_tea, 1, "online").await;
    let order_id = placed.data()["order"]["id"].as_u64().unwrap();

    let paid = customer
        .post("/api/payment/dev-complete", json!({ "order_id": order_id }))
        .await;
    assert_eq!(paid.data()["payment_status"], "paid");

    let cancelled = customer.post_empty(&format!("/api/orders/{order_id}/cancel")).await;
    assert_eq!(cancelled.data()["status"], "cancelled");
    assert_eq!(cancelled.data()["payment_status"], "refunded");
}

#[tokio::test]
async fn test_dev_complete_only_for_own_online_orders() {
    let app = test_app().await;
    let mut admin = admin(&app).await;
    let catalog = seed_catalog(&mut admin).await;
    let mut ana = customer(&app, "ana@shop.test").await;
    let mut bo = customer(&app, "bo@shop.test").await;

    let cod = place_order(&mut ana, catalog.green_tea, 1, "cod").await;
    let cod_id = cod.data()["order"]["id"].as_u64().unwrap();
    let online = place_order(&mut ana, catalog.green_tea, 1, "online").await;
    let online_id = online.data()["order"]["id"].as_u64().unwrap();

    let not_online = ana.post("/api/payment/dev-complete", json!({ "order_id": cod_id })).await;
    assert_eq!(not_online.status, StatusCode::PAYMENT_REQUIRED);

    let not_yours = bo.post("/api/payment/dev-complete", json!({ "order_id": online_id })).await;
    assert_eq!(not_yours.status, StatusCode::NOT_FOUND);

    let declined = ana
        .post("/api/payment/dev-complete", json!({ "order_id": online_id, "code": "51" }))
        .await;
    assert_eq!(declined.data()["status"], "cancelled");
}

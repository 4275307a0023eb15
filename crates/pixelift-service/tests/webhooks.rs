//! Stripe webhook integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use pixelift_core::SIGNUP_CREDITS;
use pixelift_store::Store;
use serde_json::json;

fn checkout_event(session_id: &str, buyer_id: &str) -> String {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "amount_total": 500,
                "metadata": {
                    "plan": "pro",
                    "credits": "20",
                    "buyerId": buyer_id
                }
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn missing_webhook_secret_is_server_error() {
    let harness = TestHarness::without_webhook_secret().await;

    let body = checkout_event("cs_nosecret", "ignored");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::stripe_signature(&body))
        .text(body)
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/webhooks/stripe")
        .text(checkout_event("cs_nosig", "ignored"))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn wrongly_signed_body_creates_no_transaction() {
    let harness = TestHarness::new().await;
    let user = harness.resolve("sub_hook1").await;

    let body = checkout_event("cs_badsig", user["id"].as_str().unwrap());
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header(
            "stripe-signature",
            // Signed over a different body.
            TestHarness::stripe_signature("{\"other\":true}"),
        )
        .text(body)
        .await;

    response.assert_status_bad_request();

    // Nothing persisted, nothing credited.
    assert!(harness
        .store
        .get_transaction_by_stripe_id("cs_badsig")
        .unwrap()
        .is_none());
    let stored = harness.store.get_user_by_subject("sub_hook1").unwrap().unwrap();
    assert_eq!(stored.credit_balance, SIGNUP_CREDITS);
}

#[tokio::test]
async fn checkout_completed_records_transaction_and_credits_buyer() {
    let harness = TestHarness::new().await;
    let user = harness.resolve("sub_hook2").await;
    let buyer_id = user["id"].as_str().unwrap();

    let body = checkout_event("cs_good", buyer_id);
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::stripe_signature(&body))
        .text(body)
        .await;

    response.assert_status_ok();
    let payload: serde_json::Value = response.json();
    assert_eq!(payload["message"], "OK");
    assert_eq!(payload["transaction"]["amount"], 5.0);
    assert_eq!(payload["transaction"]["credits"], 20);
    assert_eq!(payload["transaction"]["plan"], "pro");

    let stored = harness.store.get_user_by_subject("sub_hook2").unwrap().unwrap();
    assert_eq!(stored.credit_balance, SIGNUP_CREDITS + 20);

    let tx = harness
        .store
        .get_transaction_by_stripe_id("cs_good")
        .unwrap()
        .unwrap();
    assert_eq!(tx.credits, 20);
}

#[tokio::test]
async fn redelivered_event_does_not_double_credit() {
    let harness = TestHarness::new().await;
    let user = harness.resolve("sub_hook3").await;
    let buyer_id = user["id"].as_str().unwrap();

    let body = checkout_event("cs_redeliver", buyer_id);
    for _ in 0..2 {
        let response = harness
            .server
            .post("/webhooks/stripe")
            .add_header("stripe-signature", TestHarness::stripe_signature(&body))
            .text(body.clone())
            .await;
        response.assert_status_ok();
        let payload: serde_json::Value = response.json();
        assert_eq!(payload["message"], "OK");
        assert_eq!(payload["transaction"]["stripe_id"], "cs_redeliver");
    }

    // Credited exactly once.
    let stored = harness.store.get_user_by_subject("sub_hook3").unwrap().unwrap();
    assert_eq!(stored.credit_balance, SIGNUP_CREDITS + 20);
    let listed = harness
        .store
        .list_transactions_by_user(&stored.id, 10, 0)
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn unrecognized_event_acknowledged_with_empty_body() {
    let harness = TestHarness::new().await;

    let body = json!({
        "id": "evt_2",
        "type": "invoice.payment_failed",
        "data": { "object": { "id": "in_1" } }
    })
    .to_string();

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::stripe_signature(&body))
        .text(body)
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "");
}

#[tokio::test]
async fn unknown_buyer_is_rejected() {
    let harness = TestHarness::new().await;

    // Valid signature, valid shape, but the buyer does not exist locally.
    let body = checkout_event("cs_ghost", &pixelift_core::UserId::generate().to_string());
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", TestHarness::stripe_signature(&body))
        .text(body)
        .await;

    response.assert_status_not_found();
    assert!(harness
        .store
        .get_transaction_by_stripe_id("cs_ghost")
        .unwrap()
        .is_none());
}

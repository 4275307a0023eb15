//! Credit balance and debit integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use pixelift_core::SIGNUP_CREDITS;
use serde_json::json;

#[tokio::test]
async fn balance_starts_at_signup_grant() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_bal").await;

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", TestHarness::auth_header("sub_bal"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credit_balance"], SIGNUP_CREDITS);
}

#[tokio::test]
async fn balance_without_resolution_fails() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", TestHarness::auth_header("sub_nobody"))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn balance_without_auth_fails() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/credits/balance").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn each_debit_charges_the_fee_again() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_fee").await;

    for expected in (0..SIGNUP_CREDITS).rev() {
        let response = harness
            .server
            .post("/v1/credits/debit")
            .add_header("authorization", TestHarness::auth_header("sub_fee"))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["credit_balance"], expected);
    }

    // The floor is zero: the next debit is rejected and the balance stays.
    let response = harness
        .server
        .post("/v1/credits/debit")
        .add_header("authorization", TestHarness::auth_header("sub_fee"))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 0);
}

#[tokio::test]
async fn transactions_empty_before_any_purchase() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_txs").await;

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", TestHarness::auth_header("sub_txs"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"], json!([]));
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn plans_catalog_is_public() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/plans").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let plans = body.as_array().unwrap();
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[1]["key"], "pro");
    assert_eq!(plans[1]["credits"], 120);
}

#[tokio::test]
async fn checkout_rejects_unknown_and_free_plans() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_buy").await;

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header("sub_buy"))
        .json(&json!({ "plan": "ultimate" }))
        .await;
    response.assert_status_bad_request();

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header("sub_buy"))
        .json(&json!({ "plan": "free" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn checkout_without_stripe_is_bad_gateway() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_buy2").await;

    let response = harness
        .server
        .post("/v1/checkout")
        .add_header("authorization", TestHarness::auth_header("sub_buy2"))
        .json(&json!({ "plan": "pro" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

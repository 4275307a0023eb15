//! User resolution integration tests.

mod common;

use common::TestHarness;
use pixelift_core::{User, SIGNUP_CREDITS};
use pixelift_store::Store;
use serde_json::json;

#[tokio::test]
async fn resolve_creates_user_with_signup_credits() {
    let harness = TestHarness::new().await;

    let body = harness.resolve("sub_new").await;

    assert_eq!(body["subject"], "sub_new");
    assert_eq!(body["email"], "sub_new@example.com");
    assert_eq!(body["username"], "u-sub_new");
    assert_eq!(body["credit_balance"], SIGNUP_CREDITS);

    // Exactly one record exists.
    let stored = harness.store.get_user_by_subject("sub_new").unwrap().unwrap();
    assert_eq!(stored.id.to_string(), body["id"].as_str().unwrap());
}

#[tokio::test]
async fn resolve_is_idempotent() {
    let harness = TestHarness::new().await;

    let first = harness.resolve("sub_repeat").await;
    let second = harness.resolve("sub_repeat").await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["credit_balance"], SIGNUP_CREDITS);
}

#[tokio::test]
async fn resolve_links_legacy_record_by_email() {
    let harness = TestHarness::new().await;

    // A record created through another channel: same email the provider will
    // report, but no subject link yet.
    let mut legacy = User::new("legacy-import", "sub_link@example.com", "old-name", "");
    legacy.credit_balance = 42;
    harness.store.put_user(&legacy).unwrap();

    let body = harness.resolve("sub_link").await;

    // Linked, not duplicated: same id, same balance, subject attached.
    assert_eq!(body["id"], legacy.id.to_string());
    assert_eq!(body["credit_balance"], 42);
    assert_eq!(body["subject"], "sub_link");

    let linked = harness.store.get_user_by_subject("sub_link").unwrap().unwrap();
    assert_eq!(linked.id, legacy.id);
}

#[tokio::test]
async fn me_requires_resolution_first() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", TestHarness::auth_header("sub_unseen"))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn me_requires_auth() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/users/me").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn update_profile_fields() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_upd").await;

    let response = harness
        .server
        .patch("/v1/users/me")
        .add_header("authorization", TestHarness::auth_header("sub_upd"))
        .json(&json!({ "username": "renamed", "first_name": "Ada" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["username"], "renamed");
    assert_eq!(body["first_name"], "Ada");
    // Untouched fields survive.
    assert_eq!(body["email"], "sub_upd@example.com");
}

#[tokio::test]
async fn delete_account_removes_record() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_del").await;

    let response = harness
        .server
        .delete("/v1/users/me")
        .add_header("authorization", TestHarness::auth_header("sub_del"))
        .await;
    response.assert_status_ok();

    assert!(harness
        .store
        .get_user_by_subject("sub_del")
        .unwrap()
        .is_none());
}

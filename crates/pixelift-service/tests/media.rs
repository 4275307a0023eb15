//! Signed upload parameter integration tests.

mod common;

use common::TestHarness;

#[tokio::test]
async fn signature_issued_to_resolved_users() {
    let harness = TestHarness::new().await;
    harness.resolve("sub_media").await;

    let response = harness
        .server
        .get("/v1/media/signature")
        .add_header("authorization", TestHarness::auth_header("sub_media"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["cloud_name"], "demo");
    assert_eq!(body["upload_preset"], "pixelift_preset");
    assert_eq!(body["signature"].as_str().unwrap().len(), 64);
    assert!(body["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn signature_requires_auth() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/media/signature").await;
    response.assert_status_unauthorized();
}

//! Common test utilities for pixelift integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use pixelift_service::crypto::hmac_sha256_hex;
use pixelift_service::{create_router, AppState, ServiceConfig};
use pixelift_store::RocksStore;

/// Webhook secret used by test harnesses.
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Responds to identity profile fetches for any subject, deriving a stable
/// profile from the subject in the request path.
struct ProfileResponder;

impl Respond for ProfileResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let subject = request
            .url
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": subject,
            "email_addresses": [{ "email_address": format!("{subject}@example.com") }],
            "username": format!("u-{subject}"),
            "first_name": "Test",
            "last_name": "User",
            "image_url": "https://img.example/avatar.png"
        }))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and asserting persisted state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Stubbed identity provider (kept alive for test duration).
    pub _identity: MockServer,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and a stubbed
    /// identity provider.
    pub async fn new() -> Self {
        Self::build(Some(WEBHOOK_SECRET.to_string())).await
    }

    /// Harness variant with no webhook secret configured.
    pub async fn without_webhook_secret() -> Self {
        Self::build(None).await
    }

    async fn build(stripe_webhook_secret: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let identity = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v1/users/.+$"))
            .respond_with(ProfileResponder)
            .mount(&identity)
            .await;

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            auth_audience: "pixelift".into(),
            identity_api_url: Some(identity.uri()),
            identity_api_key: Some("sk_identity_test".into()),
            media_cloud_name: Some("demo".into()),
            media_api_key: Some("media_key".into()),
            media_api_secret: Some("media_secret".into()),
            media_upload_preset: "pixelift_preset".into(),
            stripe_api_key: None,
            stripe_webhook_secret,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            _identity: identity,
        }
    }

    /// Authorization header for a subject.
    pub fn auth_header(subject: &str) -> String {
        format!("Bearer test-token:{subject}")
    }

    /// Resolve a subject through the API, returning the created/linked user
    /// as JSON.
    pub async fn resolve(&self, subject: &str) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/users/resolve")
            .add_header("authorization", Self::auth_header(subject))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// A signed `Stripe-Signature` header value for `body`.
    pub fn stripe_signature(body: &str) -> String {
        let timestamp = "1700000000";
        let signature = hmac_sha256_hex(WEBHOOK_SECRET, &format!("{timestamp}.{body}"));
        format!("t={timestamp},v1={signature}")
    }
}

//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/pixelift").
    pub data_dir: String,

    /// Identity provider base URL; JWKS is served at
    /// `<base>/.well-known/jwks.json`.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "pixelift").
    pub auth_audience: String,

    /// Identity provider backend API URL (optional; profile fetches).
    pub identity_api_url: Option<String>,

    /// Identity provider backend API key (optional).
    pub identity_api_key: Option<String>,

    /// Media CDN cloud name (optional).
    pub media_cloud_name: Option<String>,

    /// Media CDN API key (optional).
    pub media_api_key: Option<String>,

    /// Media CDN API secret, used to sign uploads (optional).
    pub media_api_secret: Option<String>,

    /// Unsigned upload preset name shown to browser upload widgets.
    pub media_upload_preset: String,

    /// Stripe API key (optional).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook secret (optional; the webhook endpoint fails closed
    /// with 500 when unset).
    pub stripe_webhook_secret: Option<String>,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Identity provider secrets file structure.
#[derive(Debug, Deserialize)]
struct IdentitySecrets {
    api_url: String,
    api_key: String,
}

/// Media CDN secrets file structure.
#[derive(Debug, Deserialize)]
struct MediaSecrets {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    #[serde(default)]
    upload_preset: Option<String>,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (identity_api_url, identity_api_key) = load_identity_secrets();
        let (media_cloud_name, media_api_key, media_api_secret, media_upload_preset) =
            load_media_secrets();
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/pixelift".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.pixelift.app".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "pixelift".into()),
            identity_api_url,
            identity_api_key,
            media_cloud_name,
            media_api_key,
            media_api_secret,
            media_upload_preset: media_upload_preset
                .unwrap_or_else(|| "pixelift_preset".to_string()),
            stripe_api_key,
            stripe_webhook_secret,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load identity provider secrets from file or environment.
fn load_identity_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/identity.json", "../.secrets/identity.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<IdentitySecrets>(path) {
            tracing::info!(path = %path, "Loaded identity provider secrets from file");
            return (Some(secrets.api_url), Some(secrets.api_key));
        }
    }

    tracing::debug!("Identity secrets file not found, using environment variables");
    (
        std::env::var("IDENTITY_API_URL").ok(),
        std::env::var("IDENTITY_API_KEY").ok(),
    )
}

/// Load media CDN secrets from file or environment.
fn load_media_secrets() -> (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
) {
    let secret_paths = [".secrets/media.json", "../.secrets/media.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<MediaSecrets>(path) {
            tracing::info!(path = %path, "Loaded media CDN secrets from file");
            return (
                Some(secrets.cloud_name),
                Some(secrets.api_key),
                Some(secrets.api_secret),
                secrets.upload_preset,
            );
        }
    }

    tracing::debug!("Media secrets file not found, using environment variables");
    (
        std::env::var("MEDIA_CLOUD_NAME").ok(),
        std::env::var("MEDIA_API_KEY").ok(),
        std::env::var("MEDIA_API_SECRET").ok(),
        std::env::var("MEDIA_UPLOAD_PRESET").ok(),
    )
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/pixelift".into(),
            auth_base_url: "https://auth.pixelift.app".into(),
            auth_audience: "pixelift".into(),
            identity_api_url: None,
            identity_api_key: None,
            media_cloud_name: None,
            media_api_key: None,
            media_api_secret: None,
            media_upload_preset: "pixelift_preset".into(),
            stripe_api_key: None,
            stripe_webhook_secret: None,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

//! Application state.

use std::sync::Arc;

use pixelift_store::RocksStore;

use crate::config::ServiceConfig;
use crate::identity::IdentityClient;
use crate::media::MediaClient;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Identity provider backend client (optional).
    pub identity: Option<Arc<IdentityClient>>,

    /// Media CDN client (optional).
    pub media: Option<Arc<MediaClient>>,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        // Create the identity client if configured
        let identity = config
            .identity_api_url
            .as_ref()
            .zip(config.identity_api_key.as_ref())
            .and_then(|(url, key)| match IdentityClient::new(url, key) {
                Ok(client) => {
                    tracing::info!(identity_url = %url, "Identity provider integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create identity client");
                    None
                }
            });

        if identity.is_none() {
            tracing::warn!("Identity provider not configured - new users cannot be created");
        }

        // Create the media client if configured
        let media = match (
            config.media_cloud_name.as_ref(),
            config.media_api_key.as_ref(),
            config.media_api_secret.as_ref(),
        ) {
            (Some(cloud), Some(key), Some(secret)) => {
                tracing::info!(cloud_name = %cloud, "Media CDN integration enabled");
                Some(Arc::new(MediaClient::new(
                    cloud,
                    key,
                    secret,
                    config.media_upload_preset.clone(),
                )))
            }
            _ => {
                tracing::warn!("Media CDN not configured - transformation URLs will not be derived");
                None
            }
        };

        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - credit purchases will not be available");
        }

        Self {
            store,
            config,
            identity,
            media,
            stripe,
        }
    }

    /// Check if the identity provider backend is configured.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}

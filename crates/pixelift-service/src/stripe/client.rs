//! Stripe API client implementation.

use std::time::Duration;

use reqwest::Client;

use pixelift_core::{CreditPlan, UserId};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};

use super::types::{CheckoutSession, StripeErrorResponse};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Malformed signature header.
    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client from a secret API key
    /// (`sk_test_...` or `sk_live_...`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Create a Checkout session for purchasing a credit plan.
    ///
    /// The buyer id, plan key, and credit count travel in the session
    /// metadata and come back to us on the `checkout.session.completed`
    /// webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        buyer: &UserId,
        plan: &CreditPlan,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", buyer.to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                plan.name.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                format!("{} pixelift credits", plan.credits),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                plan.price_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[plan]", plan.key.to_string()),
            ("metadata[credits]", plan.credits.to_string()),
            ("metadata[buyerId]", buyer.to_string()),
        ];

        tracing::debug!(
            buyer = %buyer,
            plan = %plan.key,
            amount_cents = %plan.price_cents,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

/// Verify a webhook payload against the `Stripe-Signature` header.
///
/// The header carries a timestamp and one or more `v1` signatures:
/// `t=<timestamp>,v1=<sig>[,v1=<sig>...]`. The expected signature is
/// HMAC-SHA256 over `"{timestamp}.{payload}"` with the endpoint secret;
/// any matching `v1` candidate passes (constant-time comparison).
///
/// # Errors
///
/// - [`StripeError::MalformedSignature`] if the header has no timestamp.
/// - [`StripeError::InvalidSignature`] if no candidate matches.
pub fn verify_webhook_signature(
    secret: &str,
    payload: &str,
    signature: &str,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| StripeError::MalformedSignature("missing timestamp".to_string()))?;

    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature);
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let expected = hmac_sha256_hex(secret, &signed_payload);

    let valid = signatures.iter().any(|sig| constant_time_eq(&expected, sig));

    if valid {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature)
    }
}

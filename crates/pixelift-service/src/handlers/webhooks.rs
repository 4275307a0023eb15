//! Stripe webhook receiver.
//!
//! The one boundary with a strict status discipline: missing configuration
//! is 500, a bad signature is 400, and every recognized-or-not event that
//! verifies is 200.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use pixelift_core::{Transaction, UserId};
use pixelift_store::{Store, StoreError};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::verify_webhook_signature;

use super::credits::TransactionResponse;

/// Stripe webhook payload (the subset we read).
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event ID.
    pub id: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    // Fail closed: without a secret no event can be trusted.
    let secret = state
        .config
        .stripe_webhook_secret
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Stripe webhook secret not configured".into()))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

    verify_webhook_signature(secret, &body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Invalid Stripe webhook signature");
        ApiError::BadRequest("Invalid webhook signature".into())
    })?;

    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received Stripe webhook"
    );

    match webhook.event_type.as_str() {
        "checkout.session.completed" => {
            let transaction = handle_checkout_completed(&state, &webhook.data.object).await?;
            Ok(Json(serde_json::json!({
                "message": "OK",
                "transaction": TransactionResponse::from(&transaction),
            }))
            .into_response())
        }
        _ => {
            tracing::debug!(event_type = %webhook.event_type, "Unhandled Stripe event");
            // Acknowledged, nothing to do.
            Ok((StatusCode::OK, "").into_response())
        }
    }
}

/// Record the purchase and grant the buyer's credits.
///
/// Redelivered events (same external payment id) return the originally
/// recorded transaction without re-crediting.
async fn handle_checkout_completed(
    state: &AppState,
    object: &serde_json::Value,
) -> Result<Transaction, ApiError> {
    let session_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("Missing session id".into()))?;

    let amount_total = object
        .get("amount_total")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);

    let metadata = object.get("metadata");

    let plan = metadata
        .and_then(|m| m.get("plan"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    // Stripe metadata values arrive as strings; accept numbers too.
    let credits = metadata
        .and_then(|m| m.get("credits"))
        .and_then(|v| {
            v.as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .or_else(|| v.as_i64())
        })
        .unwrap_or(0);

    let buyer_str = metadata
        .and_then(|m| m.get("buyerId"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("Missing buyerId in metadata".into()))?;

    let buyer: UserId = buyer_str
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid buyerId: {buyer_str}")))?;

    let transaction = Transaction::from_checkout(session_id, amount_total, plan, credits, buyer);

    match state.store.record_purchase(&transaction) {
        Ok(balance) => {
            tracing::info!(
                session_id = %session_id,
                buyer = %buyer,
                credits = %credits,
                new_balance = %balance,
                transaction_id = %transaction.id,
                "Credits granted from checkout completion"
            );
            Ok(transaction)
        }
        Err(StoreError::DuplicateTransaction { stripe_id }) => {
            tracing::info!(
                session_id = %stripe_id,
                "Checkout event redelivered; returning original transaction"
            );
            state
                .store
                .get_transaction_by_stripe_id(&stripe_id)?
                .ok_or_else(|| ApiError::Internal("duplicate transaction missing".into()))
        }
        Err(e) => Err(e.into()),
    }
}

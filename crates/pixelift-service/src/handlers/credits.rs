//! Credit balance, debit, purchase, and transaction history handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use pixelift_core::{plans, Transaction, TRANSFORMATION_FEE};
use pixelift_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::users::require_user;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current credit balance.
    pub credit_balance: i64,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user = require_user(&state, &auth)?;

    Ok(Json(BalanceResponse {
        credit_balance: user.credit_balance,
    }))
}

/// Debit response.
#[derive(Debug, Serialize)]
pub struct DebitResponse {
    /// Balance after the debit.
    pub credit_balance: i64,
}

/// Debit the per-transformation fee from the current user.
///
/// Used by the create flow, where a transformation is applied before any
/// image record exists. For saved images the apply endpoint debits and
/// persists the merge together instead.
pub async fn debit_fee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<DebitResponse>, ApiError> {
    let user = require_user(&state, &auth)?;

    let balance = state.store.adjust_credits(&user.id, -TRANSFORMATION_FEE)?;

    tracing::info!(
        user_id = %user.id,
        fee = %TRANSFORMATION_FEE,
        new_balance = %balance,
        "Transformation fee debited"
    );

    Ok(Json(DebitResponse {
        credit_balance: balance,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// External payment id.
    pub stripe_id: String,
    /// Amount paid, in major currency units.
    pub amount: f64,
    /// Plan key.
    pub plan: String,
    /// Credits granted.
    pub credits: i64,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            stripe_id: tx.stripe_id.clone(),
            amount: tx.amount,
            plan: tx.plan.clone(),
            credits: tx.credits,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List the current user's purchase history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    let user = require_user(&state, &auth)?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions_by_user(&user.id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Plan key to purchase.
    pub plan: String,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Stripe checkout session URL.
    pub checkout_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Initiate a credit purchase via Stripe checkout.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let plan = plans::find(&body.plan)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown plan: {}", body.plan)))?;
    if plan.price_cents == 0 {
        return Err(ApiError::BadRequest("the free plan cannot be purchased".into()));
    }

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

    let user = require_user(&state, &auth)?;

    let success_url = format!("{}/profile", state.config.frontend_url);
    let cancel_url = format!("{}/", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(&user.id, plan, &success_url, &cancel_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create Stripe checkout session");
            ApiError::ExternalService(format!("Failed to create checkout session: {e}"))
        })?;

    let checkout_url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Stripe returned no checkout URL".into()))?;

    tracing::info!(
        user_id = %user.id,
        plan = %plan.key,
        session_id = %session.id,
        "Stripe checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url,
        session_id: session.id,
    }))
}

/// Plan catalog response entry.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Plan key.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// Credits granted.
    pub credits: i64,
}

/// List the plan catalog.
pub async fn list_plans() -> Json<Vec<PlanResponse>> {
    Json(
        plans::PLANS
            .iter()
            .map(|p| PlanResponse {
                key: p.key,
                name: p.name,
                price_cents: p.price_cents,
                credits: p.credits,
            })
            .collect(),
    )
}

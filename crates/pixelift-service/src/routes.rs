//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, health, images, media, users, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/plans` - Plan catalog
/// - `GET /v1/images` - Image gallery
/// - `GET /v1/images/:id` - Single image
///
/// ## Users (JWT auth)
/// - `POST /v1/users/resolve` - Resolve or create the current user
/// - `GET /v1/users/me` / `PATCH /v1/users/me` / `DELETE /v1/users/me`
///
/// ## Credits (JWT auth)
/// - `GET /v1/credits/balance`
/// - `POST /v1/credits/debit` - Debit the per-transformation fee
/// - `GET /v1/credits/transactions`
/// - `POST /v1/checkout` - Initiate a credit purchase
///
/// ## Images (JWT auth)
/// - `POST /v1/images` / `PUT /v1/images/:id` / `DELETE /v1/images/:id`
/// - `GET /v1/images/user` - Own images
/// - `POST /v1/images/:id/apply` - Merge a staged fragment and debit the fee
///
/// ## Media (JWT auth)
/// - `GET /v1/media/signature` - Signed upload parameters
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Users
        .route("/users/resolve", post(users::resolve_user))
        .route("/users/me", get(users::get_me))
        .route("/users/me", patch(users::update_me))
        .route("/users/me", delete(users::delete_me))
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/debit", post(credits::debit_fee))
        .route("/credits/transactions", get(credits::list_transactions))
        .route("/checkout", post(credits::checkout))
        .route("/plans", get(credits::list_plans))
        // Images
        .route("/images", post(images::create_image))
        .route("/images", get(images::list_images))
        .route("/images/user", get(images::list_user_images))
        .route("/images/:id", get(images::get_image))
        .route("/images/:id", put(images::update_image))
        .route("/images/:id", delete(images::delete_image))
        .route("/images/:id/apply", post(images::apply_transformation))
        // Media
        .route("/media/signature", get(media::upload_signature))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes
        .nest("/v1", api_routes)
        // Webhooks (no concurrency limit - controlled by the payment processor)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

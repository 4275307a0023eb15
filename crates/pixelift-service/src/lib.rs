//! Pixelift HTTP API service.
//!
//! This crate provides the HTTP API for the pixelift image-transformation
//! backend, including:
//!
//! - User resolution (identity-provider subject -> local record)
//! - Image transformation records and the credit-metered apply step
//! - Credit balances, purchases, and the Stripe webhook
//! - Signed upload parameters for the media CDN
//!
//! # Authentication
//!
//! End-user requests carry an identity-provider JWT validated against the
//! provider's JWKS. The Stripe webhook authenticates by signature instead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for routing consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod media;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use identity::{IdentityClient, IdentityError, IdentityProfile};
pub use media::MediaClient;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};

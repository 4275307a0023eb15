//! Stripe integration: checkout sessions and webhook signature verification.

mod client;
mod types;

pub use client::{verify_webhook_signature, StripeClient, StripeError};
pub use types::{CheckoutSession, StripeErrorResponse};

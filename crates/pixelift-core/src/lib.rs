//! Core types for the pixelift image-transformation service.
//!
//! This crate defines the domain model shared by the storage and HTTP layers:
//!
//! - Strongly-typed identifiers (users, images, transactions)
//! - User, image, and purchase transaction records
//! - Transformation kinds and their merge-able configurations
//! - The transformation staging state machine
//! - The credit plan catalog

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod image;
pub mod plans;
pub mod staging;
pub mod transaction;
pub mod transform;
pub mod user;

pub use ids::{IdError, ImageId, TransactionId, UserId};
pub use image::{Image, ImageDetails};
pub use plans::{CreditPlan, PLANS, TRANSFORMATION_FEE};
pub use staging::{SavePhase, StagePhase, StagingError, StagingSession};
pub use transaction::Transaction;
pub use transform::{
    deep_merge, AspectRatio, ParamField, TransformationConfig, TransformationKind, UnknownKind,
};
pub use user::{User, SIGNUP_CREDITS};

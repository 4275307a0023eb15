//! `RocksDB` storage layer for pixelift.
//!
//! This crate persists users, image transformation records, and purchase
//! transactions using `RocksDB` with column families for indexing. Records
//! are CBOR-encoded.
//!
//! The three record collections and their indices:
//!
//! - `users` (+ `users_by_subject`, `users_by_email`)
//! - `images` (+ `images_by_user`)
//! - `transactions` (+ `transactions_by_stripe`, `transactions_by_user`)
//!
//! Two compound operations are atomic (single `WriteBatch`): recording a
//! purchase together with the buyer's credit grant, and applying a
//! transformation (config merge) together with its credit debit. Everything
//! else is an independent read-modify-write with last-write-wins semantics.
//!
//! # Example
//!
//! ```no_run
//! use pixelift_store::{RocksStore, Store};
//! use pixelift_core::User;
//!
//! let store = RocksStore::open("/tmp/pixelift-db").unwrap();
//!
//! let user = User::new("sub_1", "ada@example.com", "ada", "");
//! store.put_user(&user).unwrap();
//! let retrieved = store.get_user(&user.id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod shared;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use shared::shared;

use pixelift_core::{
    Image, ImageDetails, ImageId, Transaction, TransactionId, TransformationConfig,
    TransformationKind, User, UserId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations behind the HTTP service.
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update a user record, maintaining the subject and email
    /// indices.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by identity-provider subject id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_subject(&self, subject: &str) -> Result<Option<User>>;

    /// Get a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Delete a user and its index entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn delete_user(&self, user_id: &UserId) -> Result<User>;

    /// Create a user on first sight, idempotently.
    ///
    /// Returns the record already stored for the candidate's subject if one
    /// exists; otherwise links a record matched by email (attaching the
    /// subject id); otherwise inserts the candidate. Concurrent calls with
    /// the same subject yield exactly one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_user_if_absent(&self, candidate: &User) -> Result<User>;

    /// Adjust a user's credit balance by `delta` (positive = credit,
    /// negative = debit) and return the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InsufficientCredits` if a debit would take the balance
    ///   below zero; the balance is unchanged.
    fn adjust_credits(&self, user_id: &UserId, delta: i64) -> Result<i64>;

    // =========================================================================
    // Image Operations
    // =========================================================================

    /// Insert an image record, maintaining the owner index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_image(&self, image: &Image) -> Result<()>;

    /// Get an image by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>>;

    /// Replace an image's mutable fields, enforcing ownership server-side.
    ///
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the image doesn't exist.
    /// - `StoreError::NotOwner` if `owner` doesn't match the stored author;
    ///   the record is unchanged.
    fn update_image(
        &self,
        image_id: &ImageId,
        owner: &UserId,
        transformation_type: TransformationKind,
        details: ImageDetails,
    ) -> Result<Image>;

    /// Delete an image, enforcing ownership server-side.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the image doesn't exist.
    /// - `StoreError::NotOwner` if `owner` doesn't match the stored author.
    fn delete_image(&self, image_id: &ImageId, owner: &UserId) -> Result<()>;

    /// List a user's images, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_images_by_user(
        &self,
        owner: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Image>>;

    /// List all images, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_images(&self, limit: usize, offset: usize) -> Result<Vec<Image>>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// Get a transaction by external payment id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Transaction>>;

    /// List a user's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Record a purchase and grant the buyer's credits atomically.
    ///
    /// Returns the buyer's new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateTransaction` if a transaction with this
    ///   external payment id already exists (webhook redelivery); nothing is
    ///   written.
    /// - `StoreError::NotFound` if the buyer doesn't exist.
    fn record_purchase(&self, transaction: &Transaction) -> Result<i64>;

    /// Apply a transformation to a saved image: persist the merged
    /// configuration and debit the owner's fee atomically.
    ///
    /// If the debit fails the stored configuration is untouched.
    ///
    /// Returns the owner's new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the image or owner doesn't exist.
    /// - `StoreError::NotOwner` if `owner` doesn't match the stored author.
    /// - `StoreError::InsufficientCredits` if the balance doesn't cover the
    ///   fee.
    fn apply_transformation(
        &self,
        image_id: &ImageId,
        owner: &UserId,
        config: &TransformationConfig,
        fee: i64,
    ) -> Result<i64>;
}

//! Key encoding utilities for `RocksDB`.
//!
//! Primary records are keyed by their id bytes; per-user indices concatenate
//! the owner's UUID with the record's ULID, so prefix scans yield a user's
//! records in time order.

use pixelift_core::{ImageId, TransactionId, UserId};

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a subject index key from an identity-provider subject id.
#[must_use]
pub fn subject_key(subject: &str) -> Vec<u8> {
    subject.as_bytes().to_vec()
}

/// Create an email index key. Emails are matched case-insensitively.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.to_ascii_lowercase().into_bytes()
}

/// Create an image key from an image ID.
#[must_use]
pub fn image_key(image_id: &ImageId) -> Vec<u8> {
    image_id.to_bytes().to_vec()
}

/// Create a user-image index key.
///
/// Format: `user_id (16 bytes) || image_id (16 bytes)`.
#[must_use]
pub fn user_image_key(user_id: &UserId, image_id: &ImageId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&image_id.to_bytes());
    key
}

/// Create a prefix for iterating all images owned by a user.
#[must_use]
pub fn user_images_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the image ID from a user-image index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_image_id_from_user_key(key: &[u8]) -> ImageId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    ImageId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create an external-payment-id index key.
#[must_use]
pub fn stripe_key(stripe_id: &str) -> Vec<u8> {
    stripe_id.as_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

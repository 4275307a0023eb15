//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id` (UUID bytes).
    pub const USERS: &str = "users";

    /// Index: identity-provider subject id -> `user_id`.
    pub const USERS_BY_SUBJECT: &str = "users_by_subject";

    /// Index: email -> `user_id` (for linking legacy records).
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Primary image records, keyed by `image_id` (ULID bytes).
    pub const IMAGES: &str = "images";

    /// Index: images by owner, keyed by `user_id || image_id`.
    /// Value is empty (index only).
    pub const IMAGES_BY_USER: &str = "images_by_user";

    /// Purchase transactions, keyed by `transaction_id` (ULID bytes).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: external payment id -> `transaction_id`. Uniqueness here is
    /// what makes webhook redelivery idempotent.
    pub const TRANSACTIONS_BY_STRIPE: &str = "transactions_by_stripe";

    /// Index: transactions by buyer, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::USERS_BY_SUBJECT,
        cf::USERS_BY_EMAIL,
        cf::IMAGES,
        cf::IMAGES_BY_USER,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_STRIPE,
        cf::TRANSACTIONS_BY_USER,
    ]
}

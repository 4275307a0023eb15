//! Error types for pixelift storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found")]
    NotFound {
        /// Which kind of record was missing.
        entity: &'static str,
    },

    /// The requesting user does not own the record.
    #[error("record is owned by another user")]
    NotOwner,

    /// Insufficient credits for a debit.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// A transaction with this external payment id was already recorded.
    #[error("duplicate transaction: {stripe_id}")]
    DuplicateTransaction {
        /// The external payment id that was duplicated.
        stripe_id: String,
    },
}

impl StoreError {
    pub(crate) fn user_not_found() -> Self {
        Self::NotFound { entity: "user" }
    }

    pub(crate) fn image_not_found() -> Self {
        Self::NotFound { entity: "image" }
    }
}

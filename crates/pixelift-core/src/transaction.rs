//! Purchase transaction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// A completed credit purchase, recorded once per payment-processor event.
///
/// Records are immutable. The external payment id (`stripe_id`) is unique in
/// the store, which is what makes webhook redelivery idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Local transaction id (time-ordered).
    pub id: TransactionId,

    /// External payment id from the processor.
    pub stripe_id: String,

    /// Amount paid, in major currency units.
    pub amount: f64,

    /// Plan key purchased.
    pub plan: String,

    /// Credits granted by this purchase.
    pub credits: i64,

    /// The purchasing user.
    pub buyer: UserId,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a transaction from a checkout-completed event.
    ///
    /// `amount_total_cents` is the processor's minor-unit total; the stored
    /// amount is in major units.
    #[must_use]
    pub fn from_checkout(
        stripe_id: impl Into<String>,
        amount_total_cents: i64,
        plan: impl Into<String>,
        credits: i64,
        buyer: UserId,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let amount = amount_total_cents as f64 / 100.0;
        Self {
            id: TransactionId::generate(),
            stripe_id: stripe_id.into(),
            amount,
            plan: plan.into(),
            credits,
            buyer,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_amount_is_major_units() {
        let buyer = UserId::generate();
        let tx = Transaction::from_checkout("cs_test_1", 500, "pro", 20, buyer);
        assert!((tx.amount - 5.0).abs() < f64::EPSILON);
        assert_eq!(tx.credits, 20);
        assert_eq!(tx.plan, "pro");
    }
}

//! Credit plan catalog and fees.

use serde::Serialize;

/// Credits debited per applied transformation.
pub const TRANSFORMATION_FEE: i64 = 1;

/// A purchasable credit pack.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditPlan {
    /// Stable plan key, carried through checkout metadata.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// Credits granted on purchase.
    pub credits: i64,
}

/// The available plans. The free tier exists for display only and cannot be
/// checked out.
pub const PLANS: [CreditPlan; 3] = [
    CreditPlan {
        key: "free",
        name: "Free",
        price_cents: 0,
        credits: 20,
    },
    CreditPlan {
        key: "pro",
        name: "Pro Package",
        price_cents: 40_00,
        credits: 120,
    },
    CreditPlan {
        key: "premium",
        name: "Premium Package",
        price_cents: 199_00,
        credits: 2000,
    },
];

/// Look up a plan by key.
#[must_use]
pub fn find(key: &str) -> Option<&'static CreditPlan> {
    PLANS.iter().find(|p| p.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_lookup() {
        assert_eq!(find("pro").map(|p| p.credits), Some(120));
        assert_eq!(find("premium").map(|p| p.price_cents), Some(19900));
        assert!(find("ultimate").is_none());
    }
}

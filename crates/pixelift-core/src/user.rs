//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to a newly created user.
pub const SIGNUP_CREDITS: i64 = 10;

/// A locally stored user, linked to an identity-provider subject.
///
/// Users are created lazily the first time an authenticated subject is seen.
/// A record created through another channel (matched by email) is linked by
/// attaching the subject id rather than duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Local user id.
    pub id: UserId,

    /// Identity-provider subject id (unique).
    pub subject: String,

    /// Email address, as reported by the identity provider.
    pub email: String,

    /// Display name.
    pub username: String,

    /// Optional given name.
    pub first_name: Option<String>,

    /// Optional family name.
    pub last_name: Option<String>,

    /// Avatar URL from the identity provider.
    pub photo_url: String,

    /// Current credit balance. Debited per applied transformation,
    /// replenished by purchases.
    pub credit_balance: i64,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the signup credit grant.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        photo_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            subject: subject.into(),
            email: email.into(),
            username: username.into(),
            first_name: None,
            last_name: None,
            photo_url: photo_url.into(),
            credit_balance: SIGNUP_CREDITS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the balance covers a deduction.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credit_balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_gets_signup_credits() {
        let user = User::new("sub_1", "a@b.c", "ada", "https://img/a.png");
        assert_eq!(user.credit_balance, SIGNUP_CREDITS);
        assert_eq!(user.subject, "sub_1");
    }

    #[test]
    fn sufficient_credits_boundary() {
        let mut user = User::new("sub_2", "b@c.d", "bob", "");
        user.credit_balance = 1;
        assert!(user.has_sufficient_credits(1));
        assert!(!user.has_sufficient_credits(2));
    }
}

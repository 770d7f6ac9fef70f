//! Subscription model.

use super::BillingMonth;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A subscription billing record.
///
/// `id`, `created_at` and `updated_at` are assigned by the store. Before the
/// record is persisted they hold the nil UUID and the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    pub plan: String,
    pub amount_cents: i64,
    /// Upper-cased currency code.
    pub currency: String,
    pub billing_period: BillingMonth,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Build an unpersisted record.
    pub fn new(
        user_id: impl Into<String>,
        plan: impl Into<String>,
        amount_cents: i64,
        currency: impl Into<String>,
        billing_period: BillingMonth,
    ) -> Self {
        Self {
            id: Uuid::nil(),
            user_id: user_id.into(),
            plan: plan.into(),
            amount_cents,
            currency: currency.into(),
            billing_period,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Whether the store has assigned an identifier yet.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_nil()
    }
}

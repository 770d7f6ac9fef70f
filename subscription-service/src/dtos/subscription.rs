//! Wire types for the subscription endpoints and their mapping to the domain model.

use crate::models::{format_month, BillingMonth, Subscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Fields accepted in create and update request bodies.
pub const SUBSCRIPTION_REQUEST_FIELDS: [&str; 5] = [
    "user_id",
    "plan",
    "amount_cents",
    "currency",
    "billing_period",
];

/// Body could not be turned into a [`SubscriptionRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid request body")]
    InvalidBody,

    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// A request field violates the subscription rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user_id is required")]
    MissingUserId,

    #[error("plan is required")]
    MissingPlan,

    #[error("amount_cents must be non-negative")]
    NegativeAmount,

    #[error("currency is required")]
    MissingCurrency,

    #[error("billing_period must be in MM-YYYY or YYYY-MM format")]
    InvalidBillingPeriod,
}

/// Body of `POST /subscriptions` and `PUT /subscriptions/{id}`.
///
/// Absent and `null` fields take their zero value and are then caught by
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscriptionRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub plan: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount_cents: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub billing_period: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SubscriptionRequest {
    /// Decode a JSON object, rejecting any field outside [`SUBSCRIPTION_REQUEST_FIELDS`].
    pub fn from_json(body: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| DecodeError::InvalidBody)?;

        let Value::Object(fields) = value else {
            return Err(DecodeError::InvalidBody);
        };

        if let Some(unknown) = fields
            .keys()
            .find(|key| !SUBSCRIPTION_REQUEST_FIELDS.contains(&key.as_str()))
        {
            return Err(DecodeError::UnknownField(unknown.clone()));
        }

        serde_json::from_value(Value::Object(fields)).map_err(|_| DecodeError::InvalidBody)
    }

    /// Validate the request and build an unpersisted record.
    ///
    /// Rules are checked in field order and the first failure is returned.
    pub fn into_subscription(self) -> Result<Subscription, ValidationError> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::MissingUserId);
        }

        let plan = self.plan.trim();
        if plan.is_empty() {
            return Err(ValidationError::MissingPlan);
        }

        if self.amount_cents < 0 {
            return Err(ValidationError::NegativeAmount);
        }

        let currency = self.currency.trim();
        if currency.is_empty() {
            return Err(ValidationError::MissingCurrency);
        }

        let billing_period = BillingMonth::parse(&self.billing_period)
            .map_err(|_| ValidationError::InvalidBillingPeriod)?;

        Ok(Subscription::new(
            user_id,
            plan,
            self.amount_cents,
            currency.to_uppercase(),
            billing_period,
        ))
    }
}

/// A subscription as rendered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user_id: String,
    pub plan: String,
    pub amount_cents: i64,
    pub currency: String,
    /// `YYYY-MM`.
    pub billing_period: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.user_id.clone(),
            plan: subscription.plan.clone(),
            amount_cents: subscription.amount_cents,
            currency: subscription.currency.clone(),
            billing_period: format_month(Some(subscription.billing_period)),
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self::from(&subscription)
    }
}

/// Query string of `GET /subscriptions/summary`.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<String>,
}

/// Aggregate revenue for one billing month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// `YYYY-MM`.
    pub month: String,
    pub total_amount_cents: i64,
}

//! Domain models for subscription-service.

pub mod billing_month;
pub mod subscription;

pub use billing_month::{format_month, BillingMonth, MonthParseError};
pub use subscription::Subscription;

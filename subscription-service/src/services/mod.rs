//! Services module for subscription-service.

pub mod metrics;
pub mod repository;

pub use metrics::{get_metrics, init_metrics, record_subscription_operation};
pub use repository::{
    PgSubscriptionRepository, PoolSettings, RepositoryError, SubscriptionRepository,
};

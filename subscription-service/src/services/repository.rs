//! Subscription persistence.
//!
//! Every operation is a single statement, so the store's per-statement
//! atomicity is all the coordination needed. Store-assigned fields (`id`,
//! `created_at`, `updated_at`) come back from the writing statement itself
//! through `RETURNING`. Dropping an operation's future cancels the in-flight
//! query.

use crate::models::{BillingMonth, Subscription};
use crate::services::metrics::{record_subscription_operation, QueryTimer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::retry::{retry_with_backoff, RetryConfig};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

/// Failure of a repository operation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row matched the given identifier.
    #[error("subscription not found")]
    NotFound,

    /// Connectivity, constraint or query failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Persistence operations for subscription records.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert `subscription`, writing the store-assigned id and timestamps back into it.
    async fn create(&self, subscription: &mut Subscription) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Subscription, RepositoryError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<Subscription>, RepositoryError>;

    /// Replace the mutable fields of the row matching `subscription.id`.
    ///
    /// The refreshed `updated_at` (and the row's `created_at`) are written back.
    async fn update(&self, subscription: &mut Subscription) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Sum of `amount_cents` over records billed in `period`; zero when none match.
    async fn monthly_summary(&self, period: BillingMonth) -> Result<i64, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Settings for establishing the PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub retry: RetryConfig,
}

/// PostgreSQL-backed subscription repository.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to PostgreSQL, retrying with incremental backoff.
    #[instrument(skip_all, fields(service = "subscription-service"))]
    pub async fn connect(
        database_url: &Secret<String>,
        settings: &PoolSettings,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            max_attempts = settings.retry.max_attempts,
            "Connecting to PostgreSQL"
        );

        let url = database_url.expose_secret().as_str();
        let pool = retry_with_backoff(&settings.retry, "connect_postgres", || {
            PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_connections)
                .acquire_timeout(settings.acquire_timeout)
                .idle_timeout(Duration::from_secs(600))
                .connect(url)
        })
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    async fn create(&self, subscription: &mut Subscription) -> Result<(), RepositoryError> {
        let _timer = QueryTimer::start("create");

        let (id, created_at, updated_at) =
            sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>)>(
                r#"
                INSERT INTO subscriptions (user_id, plan, amount_cents, currency, billing_period)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, created_at, updated_at
                "#,
            )
            .bind(&subscription.user_id)
            .bind(&subscription.plan)
            .bind(subscription.amount_cents)
            .bind(&subscription.currency)
            .bind(subscription.billing_period)
            .fetch_one(&self.pool)
            .await?;

        subscription.id = id;
        subscription.created_at = created_at;
        subscription.updated_at = updated_at;

        record_subscription_operation("create");
        info!(subscription_id = %id, "Subscription created");

        Ok(())
    }

    #[instrument(skip(self), fields(subscription_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Subscription, RepositoryError> {
        let _timer = QueryTimer::start("get");

        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, plan, amount_cents, currency, billing_period, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Subscription>, RepositoryError> {
        let _timer = QueryTimer::start("list");

        let subscriptions = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, plan, amount_cents, currency, billing_period, created_at, updated_at
            FROM subscriptions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    #[instrument(skip(self, subscription), fields(subscription_id = %subscription.id))]
    async fn update(&self, subscription: &mut Subscription) -> Result<(), RepositoryError> {
        let _timer = QueryTimer::start("update");

        let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            UPDATE subscriptions
            SET user_id = $1,
                plan = $2,
                amount_cents = $3,
                currency = $4,
                billing_period = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING created_at, updated_at
            "#,
        )
        .bind(&subscription.user_id)
        .bind(&subscription.plan)
        .bind(subscription.amount_cents)
        .bind(&subscription.currency)
        .bind(subscription.billing_period)
        .bind(subscription.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        subscription.created_at = created_at;
        subscription.updated_at = updated_at;

        record_subscription_operation("update");
        info!("Subscription updated");

        Ok(())
    }

    #[instrument(skip(self), fields(subscription_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let _timer = QueryTimer::start("delete");

        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        record_subscription_operation("delete");
        info!("Subscription deleted");

        Ok(())
    }

    #[instrument(skip(self, period), fields(period = %period))]
    async fn monthly_summary(&self, period: BillingMonth) -> Result<i64, RepositoryError> {
        let _timer = QueryTimer::start("monthly_summary");

        // SUM(bigint) is NUMERIC in PostgreSQL.
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)::BIGINT
            FROM subscriptions
            WHERE billing_period = $1
            "#,
        )
        .bind(period)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), RepositoryError> {
        let _timer = QueryTimer::start("ping");

        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

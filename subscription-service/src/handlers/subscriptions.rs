//! Subscription CRUD and monthly summary handlers.
//!
//! Request bodies are taken as raw bytes so that malformed JSON, unknown
//! fields and rule violations all surface as 400 with a specific message.
//! Repository outcomes are classified here into 404 or an opaque 500.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{SubscriptionRequest, SubscriptionResponse, SummaryQuery, SummaryResponse},
    models::{BillingMonth, MonthParseError, Subscription},
    services::RepositoryError,
    startup::AppState,
};

/// List all subscriptions, newest first.
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let subscriptions = state
        .repository
        .list()
        .await
        .map_err(|e| repository_failure(e, "failed to list subscriptions"))?;

    tracing::debug!(count = subscriptions.len(), "Listed subscriptions");

    Ok(Json(
        subscriptions
            .iter()
            .map(SubscriptionResponse::from)
            .collect(),
    ))
}

/// Create a subscription.
pub async fn create_subscription(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let mut subscription = subscription_from_body(&body)?;

    tracing::info!(
        user_id = %subscription.user_id,
        plan = %subscription.plan,
        billing_period = %subscription.billing_period,
        "Creating subscription"
    );

    state
        .repository
        .create(&mut subscription)
        .await
        .map_err(|e| repository_failure(e, "failed to create subscription"))?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(&subscription)),
    ))
}

/// Get a subscription by ID.
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let id = parse_subscription_id(&id)?;

    let subscription = state
        .repository
        .get(id)
        .await
        .map_err(|e| repository_failure(e, "failed to fetch subscription"))?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// Replace the mutable fields of a subscription.
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let id = parse_subscription_id(&id)?;
    let mut subscription = subscription_from_body(&body)?;
    subscription.id = id;

    tracing::info!(subscription_id = %id, "Updating subscription");

    state
        .repository
        .update(&mut subscription)
        .await
        .map_err(|e| repository_failure(e, "failed to update subscription"))?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Delete a subscription.
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_subscription_id(&id)?;

    tracing::info!(subscription_id = %id, "Deleting subscription");

    state
        .repository
        .delete(id)
        .await
        .map_err(|e| repository_failure(e, "failed to delete subscription"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Total billed amount for one month.
pub async fn monthly_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "Rejected summary query string");
        AppError::BadRequest(anyhow::anyhow!("invalid query string"))
    })?;

    let month = query
        .month
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("month query parameter is required")))?;

    // Whitespace-only is malformed, not missing.
    let period = BillingMonth::parse(&month)
        .map_err(|_| AppError::BadRequest(MonthParseError::InvalidFormat.into()))?;

    let total_amount_cents = state
        .repository
        .monthly_summary(period)
        .await
        .map_err(|e| repository_failure(e, "failed to fetch summary"))?;

    Ok(Json(SummaryResponse {
        month: period.to_string(),
        total_amount_cents,
    }))
}

fn parse_subscription_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("invalid subscription id")))
}

fn subscription_from_body(body: &[u8]) -> Result<Subscription, AppError> {
    let request = SubscriptionRequest::from_json(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected subscription request body");
        AppError::BadRequest(e.into())
    })?;

    request.into_subscription().map_err(|e| {
        tracing::debug!(error = %e, "Subscription request failed validation");
        AppError::BadRequest(e.into())
    })
}

fn repository_failure(err: RepositoryError, context: &'static str) -> AppError {
    match err {
        RepositoryError::NotFound => {
            AppError::NotFound(anyhow::anyhow!("subscription not found"))
        }
        RepositoryError::Storage(e) => AppError::DatabaseError(anyhow::Error::new(e).context(context)),
    }
}

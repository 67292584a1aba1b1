//! Admin billing routes
//!
//! These routes are protected by the superadmin role check.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use partnerhub_billing::OrderFilterPolicy;
use partnerhub_shared::{timestamp, Payment, Plan, SubscriptionType};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::SessionContext,
    error::{ApiError, ApiResult},
    routes::billing::{StatementResponse, SubscriptionResponse},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Defaults to the settlement total for the current window
    pub amount: Option<i64>,
    /// Defaults to now
    #[serde(default, with = "timestamp::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan: Plan,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    /// Defaults to now
    #[serde(default, with = "timestamp::option")]
    pub start: Option<OffsetDateTime>,
}

/// Settlement statement used to pre-fill the payment form
pub async fn get_partner_billing(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> ApiResult<Json<StatementResponse>> {
    let statement = state
        .billing
        .calculator
        .statement(
            partner_id,
            OrderFilterPolicy::AdminSettlement,
            OffsetDateTime::now_utc(),
        )
        .await?;

    Ok(Json(statement.into()))
}

pub async fn record_payment(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(partner_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let now = OffsetDateTime::now_utc();

    let amount = match request.amount {
        Some(amount) => amount,
        None => {
            let statement = state
                .billing
                .calculator
                .statement(partner_id, OrderFilterPolicy::AdminSettlement, now)
                .await?;
            if statement.quote.total_amount <= 0 {
                return Err(ApiError::Validation(
                    "Nothing to settle for the current billing window".to_string(),
                ));
            }
            statement.quote.total_amount
        }
    };

    let payment = state
        .billing
        .payments
        .record(partner_id, amount, request.date.unwrap_or(now))
        .await?;

    tracing::info!(
        admin_user_id = %session.user_id,
        partner_id = %partner_id,
        amount = amount,
        prefilled = request.amount.is_none(),
        "Admin recorded partner payment"
    );

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubscriptionResponse>>> {
    let now = OffsetDateTime::now_utc();
    let subscriptions = state.billing.subscriptions.list(partner_id).await?;

    Ok(Json(
        subscriptions
            .into_iter()
            .map(|s| SubscriptionResponse::new(s, now))
            .collect(),
    ))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(partner_id): Path<Uuid>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let now = OffsetDateTime::now_utc();
    let subscription = state
        .billing
        .subscriptions
        .create(
            partner_id,
            request.plan,
            request.subscription_type,
            request.start.unwrap_or(now),
        )
        .await?;

    tracing::info!(
        admin_user_id = %session.user_id,
        partner_id = %partner_id,
        subscription_id = %subscription.id,
        "Admin created subscription"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::new(subscription, now)),
    ))
}

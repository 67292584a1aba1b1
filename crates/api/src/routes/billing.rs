//! Partner billing routes
//!
//! Every handler bills the partner named by the session; there is no way to
//! ask for another partner's numbers here.

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use partnerhub_billing::{BillingQuote, BillingStatement, OrderFilterPolicy};
use partnerhub_shared::{timestamp, Payment, Plan, Subscription};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::SessionContext, error::ApiResult, state::AppState};

const DEFAULT_PAYMENTS_LIMIT: u32 = 20;

/// Statement as returned to the dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    pub partner_id: Uuid,
    pub subscription_id: Uuid,
    pub plan: Plan,
    pub policy: OrderFilterPolicy,
    #[serde(with = "timestamp::option")]
    pub window_start: Option<OffsetDateTime>,
    #[serde(with = "timestamp::option")]
    pub window_end: Option<OffsetDateTime>,
    /// `orderCount`, `orderAmount`, `totalAmount`
    #[serde(flatten)]
    pub quote: BillingQuote,
}

impl From<BillingStatement> for StatementResponse {
    fn from(statement: BillingStatement) -> Self {
        Self {
            partner_id: statement.partner_id,
            subscription_id: statement.subscription_id,
            plan: statement.plan,
            policy: statement.policy,
            window_start: statement.window.map(|w| w.start),
            window_end: statement.window.map(|w| w.end),
            quote: statement.quote,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub is_active: bool,
}

impl SubscriptionResponse {
    pub fn new(subscription: Subscription, now: OffsetDateTime) -> Self {
        Self {
            is_active: subscription.is_active(now),
            subscription,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    pub limit: Option<u32>,
}

/// Amount due so far in the current window
pub async fn get_estimate(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<StatementResponse>> {
    let statement = state
        .billing
        .calculator
        .statement(
            session.user_id,
            OrderFilterPolicy::CustomerEstimate,
            OffsetDateTime::now_utc(),
        )
        .await?;

    Ok(Json(statement.into()))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let now = OffsetDateTime::now_utc();
    let subscription = state
        .billing
        .subscriptions
        .current(session.user_id, now)
        .await?;

    Ok(Json(SubscriptionResponse::new(subscription, now)))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<PaymentsQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAYMENTS_LIMIT);
    let payments = state
        .billing
        .payments
        .history(session.user_id, limit)
        .await?;

    Ok(Json(payments))
}

//! Order-based billing calculation
//!
//! Produces the amount a partner owes for the current billing window. Flat
//! plans bill their face value; `flexible` and `growth` bill per qualifying
//! order counted since the last payment.

use std::sync::Arc;

use partnerhub_shared::{select_current_subscription, Plan, Subscription};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::filter::OrderFilterPolicy;
use crate::pricing::BillingQuote;
use crate::source::BillingDataSource;
use crate::window::BillingWindow;

/// Result of a billing calculation for one partner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingStatement {
    pub partner_id: Uuid,
    pub subscription_id: Uuid,
    pub plan: Plan,
    pub policy: OrderFilterPolicy,
    /// `None` for flat plans and for empty windows
    pub window: Option<BillingWindow>,
    pub quote: BillingQuote,
}

/// Calculates billing statements from a [`BillingDataSource`]
pub struct OrderBillingCalculator<S> {
    source: Arc<S>,
}

impl<S> Clone for OrderBillingCalculator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: BillingDataSource> OrderBillingCalculator<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Statement for the partner's current subscription
    pub async fn statement(
        &self,
        partner_id: Uuid,
        policy: OrderFilterPolicy,
        now: OffsetDateTime,
    ) -> BillingResult<BillingStatement> {
        let subscriptions = self.source.partner_subscriptions(partner_id).await?;
        let subscription = select_current_subscription(&subscriptions, now)
            .ok_or(BillingError::NoSubscription(partner_id))?;

        self.statement_for(subscription, policy, now).await
    }

    /// Statement for a known subscription
    pub async fn statement_for(
        &self,
        subscription: &Subscription,
        policy: OrderFilterPolicy,
        now: OffsetDateTime,
    ) -> BillingResult<BillingStatement> {
        let partner_id = subscription.partner_id;
        let plan = subscription.plan;
        let mut statement = BillingStatement {
            partner_id,
            subscription_id: subscription.id,
            plan,
            policy,
            window: None,
            quote: BillingQuote::zero(),
        };

        if !plan.is_order_based() {
            statement.quote = BillingQuote::flat(plan);
            return Ok(statement);
        }

        let last_payment = self.source.last_payment(partner_id).await?;
        let Some(window) = BillingWindow::for_subscription(subscription, last_payment.as_ref(), now)
        else {
            tracing::info!(
                partner_id = %partner_id,
                subscription_id = %subscription.id,
                last_payment = ?last_payment.as_ref().map(|p| p.date),
                expiry_date = %subscription.expiry_date,
                "Billing window is empty, nothing to bill"
            );
            return Ok(statement);
        };

        let bounds = window.bounds()?;
        let orders = self
            .source
            .qualifying_orders(partner_id, &bounds, policy)
            .await?;
        let order_count = orders.len() as i64;

        statement.window = Some(window);
        statement.quote =
            BillingQuote::for_orders(plan, order_count).unwrap_or_else(|| BillingQuote::flat(plan));

        tracing::debug!(
            partner_id = %partner_id,
            plan = %plan,
            policy = %policy,
            window_start = %bounds.start,
            window_end = %bounds.end,
            order_count = order_count,
            total_amount = statement.quote.total_amount,
            "Calculated order-based billing"
        );

        Ok(statement)
    }
}

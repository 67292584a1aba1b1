//! Settlement sweep across all order-based partners
//!
//! Lists partners holding an active `flexible` or `growth` subscription and
//! computes the admin settlement statement against each partner's current
//! subscription, once per partner. A failure for one partner is reported in
//! its result and does not stop the sweep.

use std::collections::HashSet;
use std::sync::Arc;

use partnerhub_shared::select_current_subscription;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calculator::{BillingStatement, OrderBillingCalculator};
use crate::error::BillingResult;
use crate::filter::OrderFilterPolicy;
use crate::source::BillingDataSource;

/// Outcome of the sweep for one partner
#[derive(Debug, Clone)]
pub enum SweepResult {
    /// Partner has a non-zero amount due
    Due { statement: BillingStatement },
    /// Window was empty or had no billable amount
    NothingDue { partner_id: Uuid },
    Error { partner_id: Uuid, error: String },
}

pub struct SettlementSweep<S> {
    source: Arc<S>,
    calculator: OrderBillingCalculator<S>,
}

impl<S> Clone for SettlementSweep<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            calculator: self.calculator.clone(),
        }
    }
}

impl<S: BillingDataSource> SettlementSweep<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            calculator: OrderBillingCalculator::new(Arc::clone(&source)),
            source,
        }
    }

    /// Run the sweep; only the initial subscription listing can fail as a whole
    pub async fn run(&self, now: OffsetDateTime) -> BillingResult<Vec<SweepResult>> {
        let candidates = self.source.active_order_based_subscriptions(now).await?;

        let mut seen = HashSet::new();
        let partners: Vec<Uuid> = candidates
            .iter()
            .map(|s| s.partner_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut results = Vec::with_capacity(partners.len());
        for partner_id in partners {
            let result = match self.settle(partner_id, now).await {
                Ok(Some(statement)) if statement.quote.total_amount > 0 => {
                    SweepResult::Due { statement }
                }
                Ok(Some(_)) => SweepResult::NothingDue { partner_id },
                Ok(None) => continue,
                Err(e) => SweepResult::Error {
                    partner_id,
                    error: e.to_string(),
                },
            };
            results.push(result);
        }

        Ok(results)
    }

    /// Settlement against the partner's current subscription; `None` when that
    /// subscription is not order-based
    async fn settle(
        &self,
        partner_id: Uuid,
        now: OffsetDateTime,
    ) -> BillingResult<Option<BillingStatement>> {
        let subscriptions = self.source.partner_subscriptions(partner_id).await?;
        let Some(current) = select_current_subscription(&subscriptions, now)
            .filter(|s| s.plan.is_order_based())
        else {
            tracing::debug!(
                partner_id = %partner_id,
                "Current subscription is not order-based, skipping settlement"
            );
            return Ok(None);
        };

        self.calculator
            .statement_for(current, OrderFilterPolicy::AdminSettlement, now)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemorySource;
    use partnerhub_shared::{Order, OrderStatus, OrderType, Plan, Subscription, SubscriptionType};
    use time::macros::datetime;

    fn subscription(partner_id: Uuid, plan: Plan, expiry_date: OffsetDateTime) -> Subscription {
        created_on(partner_id, plan, datetime!(2024-01-01 0:00 UTC), expiry_date)
    }

    fn created_on(
        partner_id: Uuid,
        plan: Plan,
        created_at: OffsetDateTime,
        expiry_date: OffsetDateTime,
    ) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            partner_id,
            plan,
            subscription_type: SubscriptionType::Monthly,
            created_at,
            expiry_date,
        }
    }

    fn completed(created_at: OffsetDateTime) -> Order {
        Order {
            id: Uuid::new_v4(),
            status: OrderStatus::Completed,
            created_at,
            total_price: 150.0,
            order_type: OrderType::Delivery,
        }
    }

    #[tokio::test]
    async fn test_sweep_skips_flat_and_expired() {
        let busy = Uuid::new_v4();
        let idle = Uuid::new_v4();
        let flat = Uuid::new_v4();
        let expired = Uuid::new_v4();
        let source = InMemorySource::new()
            .with_subscription(subscription(busy, Plan::Flexible, datetime!(2024-02-01 0:00 UTC)))
            .with_subscription(subscription(idle, Plan::Flexible, datetime!(2024-02-01 0:00 UTC)))
            .with_subscription(subscription(flat, Plan::Flat500, datetime!(2024-02-01 0:00 UTC)))
            .with_subscription(subscription(expired, Plan::Growth, datetime!(2024-01-05 0:00 UTC)))
            .with_order(busy, completed(datetime!(2024-01-03 10:00 UTC)))
            .with_order(busy, completed(datetime!(2024-01-04 10:00 UTC)));
        let sweep = SettlementSweep::new(Arc::new(source));

        let results = sweep.run(datetime!(2024-01-10 0:00 UTC)).await.unwrap();

        assert_eq!(results.len(), 2);
        let due: Vec<&BillingStatement> = results
            .iter()
            .filter_map(|r| match r {
                SweepResult::Due { statement } => Some(statement),
                _ => None,
            })
            .collect();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].partner_id, busy);
        assert_eq!(due[0].quote.total_amount, 20);
        assert!(results
            .iter()
            .any(|r| matches!(r, SweepResult::NothingDue { partner_id } if *partner_id == idle)));
    }

    #[tokio::test]
    async fn test_sweep_listing_failure_is_error() {
        let sweep = SettlementSweep::new(Arc::new(InMemorySource::new().failing("timeout")));
        assert!(sweep.run(datetime!(2024-01-10 0:00 UTC)).await.is_err());
    }

    #[tokio::test]
    async fn test_sweep_settles_partner_once_on_newest_plan() {
        let partner = Uuid::new_v4();
        let expiry = datetime!(2024-02-01 0:00 UTC);
        let source = InMemorySource::new()
            .with_subscription(created_on(
                partner,
                Plan::Flexible,
                datetime!(2024-01-01 0:00 UTC),
                expiry,
            ))
            .with_subscription(created_on(
                partner,
                Plan::Growth,
                datetime!(2024-01-05 0:00 UTC),
                expiry,
            ))
            .with_order(partner, completed(datetime!(2024-01-06 10:00 UTC)))
            .with_order(partner, completed(datetime!(2024-01-07 10:00 UTC)));
        let sweep = SettlementSweep::new(Arc::new(source));

        let results = sweep.run(datetime!(2024-01-10 0:00 UTC)).await.unwrap();

        assert_eq!(results.len(), 1);
        match &results[0] {
            SweepResult::Due { statement } => {
                assert_eq!(statement.partner_id, partner);
                assert_eq!(statement.plan, Plan::Growth);
                assert_eq!(statement.quote.total_amount, 520);
            }
            other => panic!("expected amount due, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweep_skips_partner_moved_to_flat_plan() {
        let partner = Uuid::new_v4();
        let expiry = datetime!(2024-02-01 0:00 UTC);
        let source = InMemorySource::new()
            .with_subscription(created_on(
                partner,
                Plan::Flexible,
                datetime!(2024-01-01 0:00 UTC),
                expiry,
            ))
            .with_subscription(created_on(
                partner,
                Plan::Flat500,
                datetime!(2024-01-05 0:00 UTC),
                expiry,
            ))
            .with_order(partner, completed(datetime!(2024-01-06 10:00 UTC)));
        let source = Arc::new(source);
        let sweep = SettlementSweep::new(Arc::clone(&source));

        let results = sweep.run(datetime!(2024-01-10 0:00 UTC)).await.unwrap();

        assert!(results.is_empty());
        assert!(source.order_queries().is_empty());
    }
}

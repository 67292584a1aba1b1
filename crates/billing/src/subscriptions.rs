//! Subscription management

use std::sync::Arc;

use partnerhub_shared::{
    select_current_subscription, NewSubscription, Plan, Subscription, SubscriptionType,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::source::BillingDataSource;

/// Reads and creates partner subscriptions
pub struct SubscriptionService<S> {
    source: Arc<S>,
}

impl<S> Clone for SubscriptionService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: BillingDataSource> SubscriptionService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// All subscriptions for a partner, newest first
    pub async fn list(&self, partner_id: Uuid) -> BillingResult<Vec<Subscription>> {
        self.source.partner_subscriptions(partner_id).await
    }

    /// The subscription billing runs against
    pub async fn current(
        &self,
        partner_id: Uuid,
        now: OffsetDateTime,
    ) -> BillingResult<Subscription> {
        let subscriptions = self.source.partner_subscriptions(partner_id).await?;
        select_current_subscription(&subscriptions, now)
            .cloned()
            .ok_or(BillingError::NoSubscription(partner_id))
    }

    /// Start a new subscription period at `start`
    pub async fn create(
        &self,
        partner_id: Uuid,
        plan: Plan,
        subscription_type: SubscriptionType,
        start: OffsetDateTime,
    ) -> BillingResult<Subscription> {
        let new_subscription = NewSubscription::starting(partner_id, plan, subscription_type, start)
            .map_err(|e| {
                BillingError::InvalidInput(format!("Cannot compute expiry from {}: {}", start, e))
            })?;

        let created = self.source.insert_subscription(&new_subscription).await?;

        tracing::info!(
            partner_id = %partner_id,
            subscription_id = %created.id,
            plan = %plan,
            subscription_type = subscription_type.as_str(),
            expiry_date = %created.expiry_date,
            "Created subscription"
        );

        Ok(created)
    }
}

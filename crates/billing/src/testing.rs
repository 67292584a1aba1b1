//! In-memory data source for calculator and service tests
//!
//! Applies the order filter policy in process the way Hasura applies the
//! generated predicate, and records every bounds/policy pair it was asked for.

use std::sync::Mutex;

use partnerhub_shared::{timestamp, NewSubscription, Order, Payment, Subscription};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::filter::OrderFilterPolicy;
use crate::source::BillingDataSource;
use crate::window::WindowBounds;

#[derive(Default)]
pub struct InMemorySource {
    pub subscriptions: Mutex<Vec<Subscription>>,
    /// partner_id, payment
    pub payments: Mutex<Vec<(Uuid, Payment)>>,
    /// partner_id, order
    pub orders: Mutex<Vec<(Uuid, Order)>>,
    pub order_queries: Mutex<Vec<(WindowBounds, OrderFilterPolicy)>>,
    /// When set, every call fails with a transport error
    pub fail_with: Mutex<Option<String>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.subscriptions.lock().unwrap().push(subscription);
        self
    }

    pub fn with_payment(self, partner_id: Uuid, date: OffsetDateTime, amount: f64) -> Self {
        self.payments.lock().unwrap().push((
            partner_id,
            Payment {
                id: Uuid::new_v4(),
                amount,
                date,
            },
        ));
        self
    }

    pub fn with_order(self, partner_id: Uuid, order: Order) -> Self {
        self.orders.lock().unwrap().push((partner_id, order));
        self
    }

    pub fn failing(self, message: &str) -> Self {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn order_queries(&self) -> Vec<(WindowBounds, OrderFilterPolicy)> {
        self.order_queries.lock().unwrap().clone()
    }

    fn check(&self) -> BillingResult<()> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(message) => Err(BillingError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn sorted_payments(&self, partner_id: Uuid) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == partner_id)
            .map(|(_, p)| p.clone())
            .collect();
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        payments
    }
}

impl BillingDataSource for InMemorySource {
    async fn partner_subscriptions(&self, partner_id: Uuid) -> BillingResult<Vec<Subscription>> {
        self.check()?;
        let mut subs: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.partner_id == partner_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subs)
    }

    async fn last_payment(&self, partner_id: Uuid) -> BillingResult<Option<Payment>> {
        self.check()?;
        Ok(self.sorted_payments(partner_id).into_iter().next())
    }

    async fn qualifying_orders(
        &self,
        partner_id: Uuid,
        bounds: &WindowBounds,
        policy: OrderFilterPolicy,
    ) -> BillingResult<Vec<Order>> {
        self.check()?;
        self.order_queries
            .lock()
            .unwrap()
            .push((bounds.clone(), policy));

        let start = timestamp::parse(&bounds.start).unwrap();
        let end = timestamp::parse(&bounds.end).unwrap();
        let statuses = policy.statuses();
        let order_type = policy.order_type();

        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == partner_id)
            .map(|(_, order)| order)
            .filter(|order| order.created_at >= start && order.created_at <= end)
            .filter(|order| statuses.contains(&order.status))
            .filter(|order| order_type.as_ref().map_or(true, |t| *t == order.order_type))
            .cloned()
            .collect())
    }

    async fn payments(&self, partner_id: Uuid, limit: u32) -> BillingResult<Vec<Payment>> {
        self.check()?;
        Ok(self
            .sorted_payments(partner_id)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn insert_payment(
        &self,
        partner_id: Uuid,
        amount: i64,
        date: OffsetDateTime,
    ) -> BillingResult<Payment> {
        self.check()?;
        let payment = Payment {
            id: Uuid::new_v4(),
            amount: amount as f64,
            date,
        };
        self.payments
            .lock()
            .unwrap()
            .push((partner_id, payment.clone()));
        Ok(payment)
    }

    async fn insert_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> BillingResult<Subscription> {
        self.check()?;
        let created = Subscription {
            id: Uuid::new_v4(),
            partner_id: subscription.partner_id,
            plan: subscription.plan,
            subscription_type: subscription.subscription_type,
            created_at: subscription.created_at,
            expiry_date: subscription.expiry_date,
        };
        self.subscriptions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn active_order_based_subscriptions(
        &self,
        now: OffsetDateTime,
    ) -> BillingResult<Vec<Subscription>> {
        self.check()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active(now) && s.plan.is_order_based())
            .cloned()
            .collect())
    }
}

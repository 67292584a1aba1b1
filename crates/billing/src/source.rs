//! Billing data source
//!
//! The calculator and services read partners' subscriptions, payments and
//! orders through [`BillingDataSource`]. [`HasuraClient`] implements it with
//! one GraphQL operation per method.

use std::future::Future;

use partnerhub_shared::{timestamp, NewSubscription, Order, Payment, Plan, Subscription};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::client::HasuraClient;
use crate::error::{BillingError, BillingResult};
use crate::filter::OrderFilterPolicy;
use crate::window::WindowBounds;

/// Read/write access to the billing tables
pub trait BillingDataSource: Send + Sync {
    /// All of a partner's subscriptions, newest first
    fn partner_subscriptions(
        &self,
        partner_id: Uuid,
    ) -> impl Future<Output = BillingResult<Vec<Subscription>>> + Send;

    /// The partner's most recent payment
    fn last_payment(
        &self,
        partner_id: Uuid,
    ) -> impl Future<Output = BillingResult<Option<Payment>>> + Send;

    /// Orders inside `bounds` that count under `policy`
    fn qualifying_orders(
        &self,
        partner_id: Uuid,
        bounds: &WindowBounds,
        policy: OrderFilterPolicy,
    ) -> impl Future<Output = BillingResult<Vec<Order>>> + Send;

    /// Payment history, newest first
    fn payments(
        &self,
        partner_id: Uuid,
        limit: u32,
    ) -> impl Future<Output = BillingResult<Vec<Payment>>> + Send;

    fn insert_payment(
        &self,
        partner_id: Uuid,
        amount: i64,
        date: OffsetDateTime,
    ) -> impl Future<Output = BillingResult<Payment>> + Send;

    fn insert_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> impl Future<Output = BillingResult<Subscription>> + Send;

    /// Unexpired flexible/growth subscriptions across all partners; a partner
    /// may appear more than once
    fn active_order_based_subscriptions(
        &self,
        now: OffsetDateTime,
    ) -> impl Future<Output = BillingResult<Vec<Subscription>>> + Send;
}

const PARTNER_SUBSCRIPTIONS: &str = r#"
query PartnerSubscriptions($partnerId: uuid!) {
  subscriptions(
    where: { partner_id: { _eq: $partnerId } }
    order_by: { created_at: desc }
  ) {
    id partner_id plan type created_at expiry_date
  }
}
"#;

const PARTNER_PAYMENTS: &str = r#"
query PartnerPayments($partnerId: uuid!, $limit: Int!) {
  payments(
    where: { partner_id: { _eq: $partnerId } }
    order_by: { date: desc }
    limit: $limit
  ) {
    id amount date
  }
}
"#;

const QUALIFYING_ORDERS: &str = r#"
query QualifyingOrders($where: orders_bool_exp!) {
  orders(where: $where, order_by: { created_at: asc }) {
    id status created_at total_price type
  }
}
"#;

const RECORD_PAYMENT: &str = r#"
mutation RecordPayment($object: payments_insert_input!) {
  insert_payments_one(object: $object) {
    id amount date
  }
}
"#;

const CREATE_SUBSCRIPTION: &str = r#"
mutation CreateSubscription($object: subscriptions_insert_input!) {
  insert_subscriptions_one(object: $object) {
    id partner_id plan type created_at expiry_date
  }
}
"#;

const ACTIVE_ORDER_BASED_SUBSCRIPTIONS: &str = r#"
query ActiveOrderBasedSubscriptions($now: timestamptz!, $plans: [String!]!) {
  subscriptions(
    where: { expiry_date: { _gt: $now }, plan: { _in: $plans } }
    order_by: { partner_id: asc, created_at: desc }
  ) {
    id partner_id plan type created_at expiry_date
  }
}
"#;

#[derive(Deserialize)]
struct SubscriptionsData {
    subscriptions: Vec<Subscription>,
}

#[derive(Deserialize)]
struct PaymentsData {
    payments: Vec<Payment>,
}

#[derive(Deserialize)]
struct OrdersData {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct InsertPaymentData {
    insert_payments_one: Option<Payment>,
}

#[derive(Deserialize)]
struct InsertSubscriptionData {
    insert_subscriptions_one: Option<Subscription>,
}

impl BillingDataSource for HasuraClient {
    async fn partner_subscriptions(&self, partner_id: Uuid) -> BillingResult<Vec<Subscription>> {
        let data: SubscriptionsData = self
            .execute(
                "PartnerSubscriptions",
                PARTNER_SUBSCRIPTIONS,
                &json!({ "partnerId": partner_id }),
            )
            .await?;
        Ok(data.subscriptions)
    }

    async fn last_payment(&self, partner_id: Uuid) -> BillingResult<Option<Payment>> {
        Ok(self.payments(partner_id, 1).await?.into_iter().next())
    }

    async fn qualifying_orders(
        &self,
        partner_id: Uuid,
        bounds: &WindowBounds,
        policy: OrderFilterPolicy,
    ) -> BillingResult<Vec<Order>> {
        let predicate = policy.predicate(partner_id, bounds);
        let data: OrdersData = self
            .execute("QualifyingOrders", QUALIFYING_ORDERS, &json!({ "where": predicate }))
            .await?;
        Ok(data.orders)
    }

    async fn payments(&self, partner_id: Uuid, limit: u32) -> BillingResult<Vec<Payment>> {
        let data: PaymentsData = self
            .execute(
                "PartnerPayments",
                PARTNER_PAYMENTS,
                &json!({ "partnerId": partner_id, "limit": limit }),
            )
            .await?;
        Ok(data.payments)
    }

    async fn insert_payment(
        &self,
        partner_id: Uuid,
        amount: i64,
        date: OffsetDateTime,
    ) -> BillingResult<Payment> {
        let variables = json!({
            "object": {
                "partner_id": partner_id,
                "amount": amount,
                "date": timestamp::format(date),
            }
        });

        let data: InsertPaymentData = self
            .execute("RecordPayment", RECORD_PAYMENT, &variables)
            .await?;

        data.insert_payments_one.ok_or_else(|| {
            BillingError::MalformedResponse("RecordPayment: no row returned".to_string())
        })
    }

    async fn insert_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> BillingResult<Subscription> {
        let data: InsertSubscriptionData = self
            .execute(
                "CreateSubscription",
                CREATE_SUBSCRIPTION,
                &json!({ "object": subscription }),
            )
            .await?;

        data.insert_subscriptions_one.ok_or_else(|| {
            BillingError::MalformedResponse("CreateSubscription: no row returned".to_string())
        })
    }

    async fn active_order_based_subscriptions(
        &self,
        now: OffsetDateTime,
    ) -> BillingResult<Vec<Subscription>> {
        let plans: Vec<&str> = Plan::order_based().iter().map(|p| p.as_str()).collect();
        let data: SubscriptionsData = self
            .execute(
                "ActiveOrderBasedSubscriptions",
                ACTIVE_ORDER_BASED_SUBSCRIPTIONS,
                &json!({ "now": timestamp::format(now), "plans": plans }),
            )
            .await?;
        Ok(data.subscriptions)
    }
}

//! Domain records shared by the billing library, API and worker

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

/// Partner subscription plan
///
/// The numeric plans are flat-priced at their face value, `flexible` and
/// `growth` are priced per qualifying order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    #[serde(rename = "300")]
    Flat300,
    #[serde(rename = "500")]
    Flat500,
    #[serde(rename = "flexible")]
    Flexible,
    #[serde(rename = "growth")]
    Growth,
    #[serde(rename = "trial")]
    Trial,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Flat300 => "300",
            Plan::Flat500 => "500",
            Plan::Flexible => "flexible",
            Plan::Growth => "growth",
            Plan::Trial => "trial",
        }
    }

    /// Whether amount due is derived from the partner's order count
    pub fn is_order_based(&self) -> bool {
        matches!(self, Plan::Flexible | Plan::Growth)
    }

    /// Face value of the plan; zero for trial and the order-based plans
    pub fn nominal_amount(&self) -> i64 {
        match self {
            Plan::Flat300 => 300,
            Plan::Flat500 => 500,
            Plan::Flexible | Plan::Growth | Plan::Trial => 0,
        }
    }

    pub fn order_based() -> [Plan; 2] {
        [Plan::Flexible, Plan::Growth]
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing cadence of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Yearly => "yearly",
        }
    }

    /// Expiry of a subscription of this type starting at `start`
    ///
    /// Adds one calendar month or year; the day is clamped to the length of
    /// the target month (Jan 31 + 1 month = Feb 29 in a leap year).
    pub fn expiry_from(
        &self,
        start: OffsetDateTime,
    ) -> Result<OffsetDateTime, time::error::ComponentRange> {
        let months = match self {
            SubscriptionType::Monthly => 1,
            SubscriptionType::Yearly => 12,
        };
        add_months(start, months)
    }
}

fn add_months(
    ts: OffsetDateTime,
    months: i32,
) -> Result<OffsetDateTime, time::error::ComponentRange> {
    let index = ts.year() * 12 + (ts.month() as i32 - 1) + months;
    let year = index.div_euclid(12);
    let month = Month::January.nth_next(index.rem_euclid(12) as u8);
    let day = ts.day().min(time::util::days_in_year_month(year, month));

    let date = Date::from_calendar_date(year, month, day)?;
    Ok(ts.replace_date(date))
}

/// A partner's subscription row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub plan: Plan,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    /// Subscription start
    #[serde(with = "crate::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "crate::timestamp")]
    pub expiry_date: OffsetDateTime,
}

impl Subscription {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expiry_date > now
    }
}

/// Insert payload for a new subscription
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSubscription {
    pub partner_id: Uuid,
    pub plan: Plan,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    #[serde(with = "crate::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "crate::timestamp")]
    pub expiry_date: OffsetDateTime,
}

impl NewSubscription {
    /// Build a subscription starting at `start`, expiring one period later
    pub fn starting(
        partner_id: Uuid,
        plan: Plan,
        subscription_type: SubscriptionType,
        start: OffsetDateTime,
    ) -> Result<Self, time::error::ComponentRange> {
        Ok(Self {
            partner_id,
            plan,
            subscription_type,
            created_at: start,
            expiry_date: subscription_type.expiry_from(start)?,
        })
    }
}

/// Pick the subscription billing should run against
///
/// Active subscriptions win over expired ones; within a group the most
/// recently created wins, then the one expiring last.
pub fn select_current_subscription(
    subscriptions: &[Subscription],
    now: OffsetDateTime,
) -> Option<&Subscription> {
    let newest = |s: &&Subscription| (s.created_at, s.expiry_date);

    subscriptions
        .iter()
        .filter(|s| s.is_active(now))
        .max_by_key(newest)
        .or_else(|| subscriptions.iter().max_by_key(newest))
}

/// A recorded partner payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(deserialize_with = "deserialize_numeric")]
    pub amount: f64,
    #[serde(with = "crate::timestamp")]
    pub date: OffsetDateTime,
}

/// Order lifecycle status; unknown values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Completed,
    Pending,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Completed => "completed",
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => OrderStatus::Completed,
            "pending" => OrderStatus::Pending,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// How an order reached the customer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderType {
    Delivery,
    Other(String),
}

impl OrderType {
    pub fn as_str(&self) -> &str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Other(s) => s,
        }
    }
}

impl From<String> for OrderType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "delivery" => OrderType::Delivery,
            _ => OrderType::Other(s),
        }
    }
}

impl From<OrderType> for String {
    fn from(order_type: OrderType) -> Self {
        order_type.as_str().to_string()
    }
}

/// Order row, read-only for billing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(with = "crate::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(deserialize_with = "deserialize_numeric")]
    pub total_price: f64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

/// Session role carried in the Hasura JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerRole {
    Partner,
    Superadmin,
}

impl PartnerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerRole::Partner => "partner",
            PartnerRole::Superadmin => "superadmin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "partner" => Some(PartnerRole::Partner),
            "superadmin" => Some(PartnerRole::Superadmin),
            _ => None,
        }
    }
}

/// Hasura `numeric` arrives as a number, or as a string when the engine
/// stringifies numerics
fn deserialize_numeric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    match Numeric::deserialize(deserializer)? {
        Numeric::Number(n) => Ok(n),
        Numeric::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid numeric '{}'", s))),
    }
}

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! PartnerHub shared types
//!
//! Typed records for the rows the billing code reads from Hasura, plus the
//! timestamp and numeric decoding helpers used at the GraphQL boundary.

pub mod timestamp;
pub mod types;

pub use timestamp::TimestampParseError;
pub use types::{
    select_current_subscription, NewSubscription, Order, OrderStatus, OrderType, PartnerRole,
    Payment, Plan, Subscription, SubscriptionType,
};

//! Plan pricing
//!
//! Amounts are whole rupees. Order-based plans charge a fixed rate per
//! qualifying order; `growth` adds a flat base fee on top.

use partnerhub_shared::Plan;
use serde::{Deserialize, Serialize};

/// Charge per qualifying order
pub const PER_ORDER_RATE: i64 = 10;

/// Flat fee added to the growth plan's order charge
pub const GROWTH_BASE_FEE: i64 = 500;

/// Amount due for a billing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingQuote {
    pub order_count: i64,
    pub order_amount: i64,
    pub total_amount: i64,
}

impl BillingQuote {
    /// Nothing to bill
    pub fn zero() -> Self {
        Self::default()
    }

    /// Quote for a plan priced per order
    ///
    /// Returns `None` for plans that are not order based.
    pub fn for_orders(plan: Plan, order_count: i64) -> Option<Self> {
        let order_amount = order_count.saturating_mul(PER_ORDER_RATE);
        let total_amount = match plan {
            Plan::Growth => order_amount.saturating_add(GROWTH_BASE_FEE),
            Plan::Flexible => order_amount,
            Plan::Flat300 | Plan::Flat500 | Plan::Trial => return None,
        };

        Some(Self {
            order_count,
            order_amount,
            total_amount,
        })
    }

    /// Quote for a flat-priced plan: the plan's face value, no orders
    pub fn flat(plan: Plan) -> Self {
        Self {
            order_count: 0,
            order_amount: 0,
            total_amount: plan.nominal_amount(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_amount == 0
    }
}

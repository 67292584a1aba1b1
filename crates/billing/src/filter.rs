//! Qualifying-order filter
//!
//! Which orders count toward a bill is decided by Hasura, not in process.
//! Two call sites historically disagreed on the filter, so each one names the
//! policy it bills under.

use partnerhub_shared::{OrderStatus, OrderType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::window::WindowBounds;

/// Named order filter per billing call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilterPolicy {
    /// Partner-facing estimate: completed or pending delivery orders
    CustomerEstimate,
    /// Admin settlement before recording a payment: completed orders of any type
    AdminSettlement,
}

impl OrderFilterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderFilterPolicy::CustomerEstimate => "customer_estimate",
            OrderFilterPolicy::AdminSettlement => "admin_settlement",
        }
    }

    pub fn statuses(&self) -> Vec<OrderStatus> {
        match self {
            OrderFilterPolicy::CustomerEstimate => {
                vec![OrderStatus::Completed, OrderStatus::Pending]
            }
            OrderFilterPolicy::AdminSettlement => vec![OrderStatus::Completed],
        }
    }

    pub fn order_type(&self) -> Option<OrderType> {
        match self {
            OrderFilterPolicy::CustomerEstimate => Some(OrderType::Delivery),
            OrderFilterPolicy::AdminSettlement => None,
        }
    }

    /// Build the `orders_bool_exp` for a partner's window
    pub fn predicate(&self, partner_id: Uuid, bounds: &WindowBounds) -> Value {
        let statuses: Vec<String> = self.statuses().into_iter().map(String::from).collect();

        let mut predicate = json!({
            "partner_id": { "_eq": partner_id },
            "created_at": { "_gte": bounds.start, "_lte": bounds.end },
            "status": { "_in": statuses },
        });

        if let (Some(order_type), Some(map)) = (self.order_type(), predicate.as_object_mut()) {
            map.insert(
                "type".to_string(),
                json!({ "_eq": order_type.as_str() }),
            );
        }

        predicate
    }
}

impl std::fmt::Display for OrderFilterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

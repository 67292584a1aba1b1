// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! PartnerHub Billing Module
//!
//! Computes what restaurant partners owe and records their settlements,
//! reading subscriptions, payments and orders from Hasura GraphQL.
//!
//! ## Features
//!
//! - **Billing Window**: From the later of subscription start and last payment,
//!   to the earlier of now and subscription expiry
//! - **Order-Based Pricing**: ₹10 per qualifying order; `growth` adds a ₹500 base fee
//! - **Filter Policies**: Customer estimate and admin settlement count different orders
//! - **Subscriptions**: Current subscription selection and period creation
//! - **Payments**: History and settlement recording
//! - **Settlement Sweep**: Amount due for every active order-based partner

pub mod calculator;
pub mod client;
pub mod error;
pub mod filter;
pub mod payments;
pub mod pricing;
pub mod source;
pub mod subscriptions;
pub mod sweep;
pub mod window;

#[cfg(test)]
mod testing;

use std::sync::Arc;

// Calculator
pub use calculator::{BillingStatement, OrderBillingCalculator};

// Client
pub use client::{HasuraClient, HasuraConfig};

// Error
pub use error::{BillingError, BillingResult};

// Filter
pub use filter::OrderFilterPolicy;

// Payments
pub use payments::{PaymentService, MAX_HISTORY_LIMIT};

// Pricing
pub use pricing::{BillingQuote, GROWTH_BASE_FEE, PER_ORDER_RATE};

// Source
pub use source::BillingDataSource;

// Subscriptions
pub use subscriptions::SubscriptionService;

// Sweep
pub use sweep::{SettlementSweep, SweepResult};

// Window
pub use window::{BillingWindow, WindowBounds};

/// Main billing service that combines all billing functionality
pub struct BillingService<S = HasuraClient> {
    pub calculator: OrderBillingCalculator<S>,
    pub payments: PaymentService<S>,
    pub subscriptions: SubscriptionService<S>,
    pub sweep: SettlementSweep<S>,
}

impl<S> Clone for BillingService<S> {
    fn clone(&self) -> Self {
        Self {
            calculator: self.calculator.clone(),
            payments: self.payments.clone(),
            subscriptions: self.subscriptions.clone(),
            sweep: self.sweep.clone(),
        }
    }
}

impl BillingService<HasuraClient> {
    /// Create a new billing service from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Ok(Self::new(HasuraClient::from_env()?))
    }

    /// Create a new billing service with explicit config
    pub fn with_config(config: HasuraConfig) -> BillingResult<Self> {
        Ok(Self::new(HasuraClient::new(config)?))
    }
}

impl<S: BillingDataSource> BillingService<S> {
    /// Create a billing service over any data source
    pub fn new(source: S) -> Self {
        let source = Arc::new(source);

        Self {
            calculator: OrderBillingCalculator::new(Arc::clone(&source)),
            payments: PaymentService::new(Arc::clone(&source)),
            subscriptions: SubscriptionService::new(Arc::clone(&source)),
            sweep: SettlementSweep::new(source),
        }
    }
}

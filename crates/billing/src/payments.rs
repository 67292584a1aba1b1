//! Payment history and settlement recording

use std::sync::Arc;

use partnerhub_shared::Payment;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::source::BillingDataSource;

/// Largest page of payment history returned in one call
pub const MAX_HISTORY_LIMIT: u32 = 100;

pub struct PaymentService<S> {
    source: Arc<S>,
}

impl<S> Clone for PaymentService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: BillingDataSource> PaymentService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Most recent payments first, at most `limit` (capped at [`MAX_HISTORY_LIMIT`])
    pub async fn history(&self, partner_id: Uuid, limit: u32) -> BillingResult<Vec<Payment>> {
        if limit == 0 {
            return Err(BillingError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }
        self.source
            .payments(partner_id, limit.min(MAX_HISTORY_LIMIT))
            .await
    }

    /// Record a settlement; the payment date becomes the next window's start
    pub async fn record(
        &self,
        partner_id: Uuid,
        amount: i64,
        date: OffsetDateTime,
    ) -> BillingResult<Payment> {
        if amount <= 0 {
            return Err(BillingError::InvalidInput(format!(
                "Payment amount must be positive, got {}",
                amount
            )));
        }

        let payment = self.source.insert_payment(partner_id, amount, date).await?;

        tracing::info!(
            partner_id = %partner_id,
            payment_id = %payment.id,
            amount = amount,
            date = %payment.date,
            "Recorded partner payment"
        );

        Ok(payment)
    }
}

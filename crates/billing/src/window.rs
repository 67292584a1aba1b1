//! Billing window resolution
//!
//! Orders are billed from the later of the subscription start and the last
//! payment, up to the earlier of now and the subscription expiry. The window
//! is compared on exact timestamps but queried on whole UTC days.

use partnerhub_shared::{Payment, Subscription};
use serde::Serialize;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::{BillingError, BillingResult};

/// Interval over which qualifying orders are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingWindow {
    #[serde(with = "partnerhub_shared::timestamp")]
    pub start: OffsetDateTime,
    #[serde(with = "partnerhub_shared::timestamp")]
    pub end: OffsetDateTime,
}

/// Day-granularity query bounds, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowBounds {
    pub start: String,
    pub end: String,
}

impl BillingWindow {
    /// Resolve the window, or `None` when it is empty
    ///
    /// An empty window (start after end) is not an error: it happens when a
    /// payment was recorded after the subscription expired, and bills nothing.
    pub fn resolve(
        subscription_start: OffsetDateTime,
        subscription_expiry: OffsetDateTime,
        last_payment_date: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Option<Self> {
        let start = match last_payment_date {
            Some(paid) if paid > subscription_start => paid,
            _ => subscription_start,
        };
        let end = if subscription_expiry > now {
            now
        } else {
            subscription_expiry
        };

        if start > end {
            return None;
        }

        Some(Self { start, end })
    }

    pub fn for_subscription(
        subscription: &Subscription,
        last_payment: Option<&Payment>,
        now: OffsetDateTime,
    ) -> Option<Self> {
        Self::resolve(
            subscription.created_at,
            subscription.expiry_date,
            last_payment.map(|p| p.date),
            now,
        )
    }

    pub fn start_date(&self) -> Date {
        self.start.to_offset(UtcOffset::UTC).date()
    }

    pub fn end_date(&self) -> Date {
        self.end.to_offset(UtcOffset::UTC).date()
    }

    /// Whole-day bounds: start of the first day, last millisecond of the last
    pub fn bounds(&self) -> BillingResult<WindowBounds> {
        let start = self
            .start_date()
            .format(format_description!("[year]-[month]-[day]T00:00:00.000Z"));
        let end = self
            .end_date()
            .format(format_description!("[year]-[month]-[day]T23:59:59.999Z"));

        match (start, end) {
            (Ok(start), Ok(end)) => Ok(WindowBounds { start, end }),
            (Err(e), _) | (_, Err(e)) => Err(BillingError::InvalidInput(format!(
                "Billing window cannot be formatted: {}",
                e
            ))),
        }
    }
}

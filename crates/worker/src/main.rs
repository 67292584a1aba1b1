//! PartnerHub Background Worker
//!
//! Handles scheduled jobs including:
//! - Settlement sweep over order-based partners (daily at 00:30 UTC by default)
//! - Health check heartbeat (every 5 minutes)

use std::sync::Arc;
use std::time::Duration;

use partnerhub_billing::{BillingService, SweepResult};
use time::OffsetDateTime;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

const DEFAULT_SWEEP_CRON: &str = "0 30 0 * * *";

/// Log results of a settlement sweep
fn log_sweep_results(results: &[SweepResult]) {
    let due = results
        .iter()
        .filter(|r| matches!(r, SweepResult::Due { .. }))
        .count();
    let nothing_due = results
        .iter()
        .filter(|r| matches!(r, SweepResult::NothingDue { .. }))
        .count();
    let errors = results
        .iter()
        .filter(|r| matches!(r, SweepResult::Error { .. }))
        .count();

    for result in results {
        match result {
            SweepResult::Due { statement } => info!(
                partner_id = %statement.partner_id,
                plan = %statement.plan,
                order_count = statement.quote.order_count,
                total_amount = statement.quote.total_amount,
                "Partner has amount due"
            ),
            SweepResult::Error { partner_id, error } => {
                error!(partner_id = %partner_id, error = %error, "Failed to compute settlement")
            }
            SweepResult::NothingDue { .. } => {}
        }
    }

    info!(
        due = due,
        nothing_due = nothing_due,
        errors = errors,
        "Settlement sweep complete"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting PartnerHub Worker");

    let billing = match BillingService::from_env() {
        Ok(b) => Arc::new(b),
        Err(e) => {
            // If Hasura isn't configured, run in minimal mode
            warn!(error = %e, "Failed to create billing service - running in minimal mode");

            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                info!("Worker heartbeat (minimal mode)");
            }
        }
    };

    let scheduler = JobScheduler::new().await?;

    // Job 1: Settlement sweep
    let sweep_cron =
        std::env::var("BILLING_SWEEP_CRON").unwrap_or_else(|_| DEFAULT_SWEEP_CRON.to_string());
    let sweep_billing = billing.clone();
    scheduler
        .add(Job::new_async(sweep_cron.as_str(), move |_uuid, _l| {
            let billing = sweep_billing.clone();
            Box::pin(async move {
                info!("Running settlement sweep");
                match billing.sweep.run(OffsetDateTime::now_utc()).await {
                    Ok(results) => log_sweep_results(&results),
                    Err(e) => error!(error = %e, "Settlement sweep could not list subscriptions"),
                }
            })
        })?)
        .await?;
    info!(cron = %sweep_cron, "Scheduled: Settlement sweep");

    // Job 2: Health check heartbeat (every 5 minutes)
    scheduler
        .add(Job::new_async("0 */5 * * * *", |_uuid, _l| {
            Box::pin(async move {
                info!("Worker heartbeat - all systems operational");
            })
        })?)
        .await?;
    info!("Scheduled: Health check heartbeat (every 5 minutes)");

    info!("Starting job scheduler");
    scheduler.start().await?;

    info!("PartnerHub Worker started successfully with {} scheduled jobs", 2);

    // The scheduler runs jobs in background tasks
    loop {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

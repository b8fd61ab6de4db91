//! Daily renewal scheduler
//!
//! Ticks every 30 seconds and runs one sweep per gateway-local day, at or
//! after the trigger hour. The explicit last-run marker makes a double
//! fire within the trigger window impossible, and a process started later
//! in the day still catches up.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use turnstile_core::renewal::gateway_tz;
use turnstile_core::RenewalSweeper;
use turnstile_db::SubscriptionRepository;

/// Gateway-local hour after which the daily sweep runs
const TRIGGER_HOUR: u32 = 8;

const TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Whether a sweep is due: at or past the trigger hour, and not already
/// run for this local day. The last-run marker is what rules out a second
/// fire inside the trigger window; a process started late in the day
/// still catches up on its first tick.
fn should_run(now: DateTime<FixedOffset>, last_run: Option<NaiveDate>) -> bool {
    now.hour() >= TRIGGER_HOUR && last_run != Some(now.date_naive())
}

/// Run the scheduler loop until the shutdown channel fires.
pub async fn run<R: SubscriptionRepository>(
    sweeper: RenewalSweeper<R>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_run: Option<NaiveDate> = None;

    tracing::info!(trigger_hour = TRIGGER_HOUR, "Renewal scheduler started");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = Utc::now().with_timezone(&gateway_tz());
                let today = now.date_naive();

                if should_run(now, last_run) {
                    tracing::info!("Starting subscription sweep");

                    match sweeper.sweep(today).await {
                        Ok(summary) => {
                            metrics::counter!("gateway_renewals_total", "outcome" => "renewed")
                                .increment(u64::from(summary.renewed));
                            metrics::counter!("gateway_renewals_total", "outcome" => "removed")
                                .increment(u64::from(summary.removed));
                            metrics::counter!("gateway_renewals_total", "outcome" => "failed")
                                .increment(u64::from(summary.failed));

                            tracing::info!(
                                renewed = summary.renewed,
                                removed = summary.removed,
                                failed = summary.failed,
                                "Subscription sweep finished"
                            );
                            last_run = Some(today);
                        }
                        Err(e) => {
                            // Store unavailable; retry on the next tick.
                            tracing::error!(error = ?e, "Subscription sweep failed");
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("Renewal scheduler stopping");
                    break;
                }
            }
        }
    }
}

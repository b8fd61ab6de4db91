//! Renewal sweep - the daily pass over expired subscriptions
//!
//! For each row whose period has ended: renew through the recurring-charge
//! collaborator when a recurring token is present, otherwise revoke channel
//! access and delete the row. Failures are contained per row so one broken
//! user never blocks the rest of the sweep.

use std::sync::Arc;

use chrono::{Days, FixedOffset, NaiveDate, Utc};
use tracing::{error, info, warn};

use turnstile_db::{SubscriptionRepository, SubscriptionRow};

use crate::error::CoreError;
use crate::messenger::ChannelMessenger;
use crate::recurring::{ChargeOutcome, RecurringCharger};
use crate::tariff;

/// Gateway-local time zone: fixed UTC+3 (Moscow, no DST)
pub fn gateway_tz() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

/// Today's date in the gateway-local time zone
pub fn local_today() -> NaiveDate {
    Utc::now().with_timezone(&gateway_tz()).date_naive()
}

/// What a sweep did, for logging and metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Rows renewed through a successful recurring charge
    pub renewed: u32,
    /// Rows removed (declined charge or no recurring token)
    pub removed: u32,
    /// Rows left untouched because of a transient failure
    pub failed: u32,
}

/// Renewal sweeper
pub struct RenewalSweeper<R: SubscriptionRepository> {
    repo: Arc<R>,
    messenger: Arc<dyn ChannelMessenger>,
    charger: Arc<dyn RecurringCharger>,
}

enum RowOutcome {
    Renewed,
    Removed,
}

impl<R: SubscriptionRepository> RenewalSweeper<R> {
    /// Create a new sweeper
    pub fn new(
        repo: Arc<R>,
        messenger: Arc<dyn ChannelMessenger>,
        charger: Arc<dyn RecurringCharger>,
    ) -> Self {
        Self {
            repo,
            messenger,
            charger,
        }
    }

    /// Run one sweep over every subscription that ended before `today`.
    ///
    /// Errs only when the expired rows cannot be read at all; per-row
    /// failures are logged and counted instead.
    pub async fn sweep(&self, today: NaiveDate) -> Result<SweepSummary, CoreError> {
        let expired = self.repo.find_expired(today).await?;
        let mut summary = SweepSummary::default();

        for row in expired {
            match self.process_row(&row, today).await {
                Ok(RowOutcome::Renewed) => summary.renewed += 1,
                Ok(RowOutcome::Removed) => summary.removed += 1,
                Err(e) => {
                    // Transient failure: leave the row for the next sweep.
                    error!(user_id = %row.user_id, error = %e, "Renewal processing failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn process_row(
        &self,
        row: &SubscriptionRow,
        today: NaiveDate,
    ) -> Result<RowOutcome, CoreError> {
        let Some(recurring_id) = row.recurring_id.as_deref() else {
            self.remove_user(row.user_id, "Your subscription has expired; channel access is closed.")
                .await;
            return Ok(RowOutcome::Removed);
        };

        let amount = tariff::price_for(row.duration_months);
        match self.charger.charge(recurring_id, amount).await? {
            ChargeOutcome::Success => {
                let new_end = today + Days::new(30 * row.duration_months.max(0) as u64);
                self.repo.update_period(row.user_id, today, new_end).await?;

                if let Err(e) = self
                    .messenger
                    .send_message(
                        row.user_id,
                        "Your subscription was renewed automatically. Thanks for staying with us!",
                    )
                    .await
                {
                    warn!(user_id = %row.user_id, error = %e, "Renewal notice not delivered");
                }

                info!(user_id = %row.user_id, months = %row.duration_months, "Subscription renewed");
                Ok(RowOutcome::Renewed)
            }
            ChargeOutcome::Declined => {
                self.remove_user(
                    row.user_id,
                    "The automatic payment did not go through; your subscription has ended.",
                )
                .await;
                Ok(RowOutcome::Removed)
            }
        }
    }

    /// Revoke channel access: kick (ban then unban), delete the row, and
    /// tell the user why. Each step's failure is logged and the remaining
    /// steps still run.
    async fn remove_user(&self, user_id: i64, reason: &str) {
        if let Err(e) = self.messenger.kick_member(user_id).await {
            error!(user_id = %user_id, error = %e, "Failed to remove user from channel");
        }

        if let Err(e) = self.repo.delete(user_id).await {
            error!(user_id = %user_id, error = %e, "Failed to delete subscription row");
        }

        if let Err(e) = self.messenger.send_message(user_id, reason).await {
            warn!(user_id = %user_id, error = %e, "Removal notice not delivered");
        }

        info!(user_id = %user_id, reason = %reason, "User removed");
    }
}

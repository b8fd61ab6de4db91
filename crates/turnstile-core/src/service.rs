//! Subscription service - callback verification and lifecycle mutations
//!
//! The result callback is the only writer of paid subscription state; the
//! success callback only grants the user-visible access (the invite link).
//! Both verify their signature before any side effect.

use std::sync::Arc;

use chrono::Days;
use serde::Deserialize;
use tracing::{info, warn};

use turnstile_db::{SubscriptionRepository, UpsertSubscription};

use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::messenger::ChannelMessenger;
use crate::renewal::local_today;
use crate::signature;

/// Query parameters the gateway sends to the result and success callbacks
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    /// Paid amount, fixed two-decimal string
    #[serde(rename = "OutSum")]
    pub out_sum: String,
    /// Synthetic invoice id (`user_id * 10 + months`)
    #[serde(rename = "InvId")]
    pub invoice_id: String,
    /// Custom field: paying user id
    #[serde(rename = "Shp_user")]
    pub user: String,
    /// Custom field: tariff duration in months
    #[serde(rename = "Shp_months")]
    pub months: String,
    /// Gateway-computed digest over the other fields
    #[serde(rename = "SignatureValue")]
    pub signature: String,
}

/// Subscription service
pub struct SubscriptionService<R: SubscriptionRepository> {
    repo: Arc<R>,
    messenger: Arc<dyn ChannelMessenger>,
    config: GatewayConfig,
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    /// Create a new subscription service
    pub fn new(repo: Arc<R>, messenger: Arc<dyn ChannelMessenger>, config: GatewayConfig) -> Self {
        Self {
            repo,
            messenger,
            config,
        }
    }

    /// Verify a callback against the given secret; identity is derived only
    /// from the verified parameters, never from the pending-payments map.
    fn verify(&self, params: &CallbackParams, password: &str) -> Result<(i64, u32), CoreError> {
        let computed = signature::sign_callback(
            &params.out_sum,
            &params.invoice_id,
            password,
            &[
                ("Shp_months", params.months.as_str()),
                ("Shp_user", params.user.as_str()),
            ],
        );

        if !signature::signatures_match(&computed, &params.signature) {
            warn!(invoice_id = %params.invoice_id, "Bad callback signature");
            return Err(CoreError::SignatureMismatch {
                invoice_id: params.invoice_id.clone(),
            });
        }

        let user_id: i64 = params
            .user
            .parse()
            .map_err(|_| CoreError::MalformedCallback("Shp_user"))?;
        let months: u32 = params
            .months
            .parse()
            .map_err(|_| CoreError::MalformedCallback("Shp_months"))?;

        Ok((user_id, months))
    }

    /// Process the server-to-server result callback.
    ///
    /// Sole authority for persisting a paid subscription. Idempotent under
    /// gateway retries: the upsert overwrites all mutable fields, so
    /// re-applying identical parameters produces the same final state.
    ///
    /// Returns the acknowledgment body the gateway expects (`OK<InvId>`).
    pub async fn confirm_payment(&self, params: &CallbackParams) -> Result<String, CoreError> {
        let (user_id, months) = self.verify(params, &self.config.password2)?;

        let start = local_today();
        let end = start + Days::new(u64::from(30 * months));

        self.repo
            .upsert(UpsertSubscription {
                user_id,
                user_name: format!("user_{user_id}"),
                start_subscription: start,
                end_subscription: end,
                duration_months: months as i32,
                recurring_id: Some(params.invoice_id.clone()),
            })
            .await?;

        info!(user_id = %user_id, months = %months, "Payment confirmed");
        Ok(format!("OK{}", params.invoice_id))
    }

    /// Process the browser success redirect.
    ///
    /// Informational: never persists subscription state. Grants the
    /// user-visible access by creating a single-use invite link and
    /// delivering it by direct message, along with a note on how to cancel
    /// auto-renewal.
    pub async fn grant_access(&self, params: &CallbackParams) -> Result<(), CoreError> {
        let (user_id, _months) = self.verify(params, &self.config.password1)?;

        let link = self
            .messenger
            .create_invite_link(&format!("Payment InvId={}", params.invoice_id))
            .await?;

        self.messenger
            .send_message(
                user_id,
                &format!(
                    "Payment received! Here is your invite to the private channel:\n{link}\n\
                     Auto-renewal is on; you can cancel it at any time."
                ),
            )
            .await?;

        info!(user_id = %user_id, invoice_id = %params.invoice_id, "Invite link delivered");
        Ok(())
    }

    /// Disable auto-renewal for a user without touching the paid period
    pub async fn cancel_auto_renewal(&self, user_id: i64) -> Result<(), CoreError> {
        self.repo.clear_recurring(user_id).await?;
        info!(user_id = %user_id, "Auto-renewal canceled");
        Ok(())
    }
}

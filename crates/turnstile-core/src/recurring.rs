//! Recurring-charge collaborator
//!
//! A renewal charge either succeeds or is declined; a decline is a normal
//! branch of the lifecycle (it triggers revocation), not an error. Errors
//! are reserved for transport failures, which leave the row untouched until
//! the next sweep.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::signature;

/// Outcome of a recurring charge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// The gateway accepted the charge
    Success,
    /// The gateway did not return the success token
    Declined,
}

/// Recurring charger trait
#[async_trait]
pub trait RecurringCharger: Send + Sync {
    /// Charge a stored payment method for a renewal amount
    async fn charge(&self, recurring_id: &str, amount: u32) -> Result<ChargeOutcome, CoreError>;
}

/// Robokassa recurring-charge client
#[derive(Clone)]
pub struct RobokassaCharger {
    client: Client,
    config: GatewayConfig,
}

impl RobokassaCharger {
    /// Create a new recurring charger
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RecurringCharger for RobokassaCharger {
    #[instrument(skip(self))]
    async fn charge(&self, recurring_id: &str, amount: u32) -> Result<ChargeOutcome, CoreError> {
        // Each recurring request needs a fresh invoice id; the wall clock
        // is unique enough at one charge per subscription per day.
        let invoice_id = Utc::now().timestamp().to_string();
        let out_sum = format!("{amount}.00");

        let signature_value = signature::sign_recurring_request(
            &self.config.merchant_login,
            &out_sum,
            &invoice_id,
            recurring_id,
            &self.config.password1,
        );

        debug!(amount = %out_sum, "Requesting recurring charge");

        let form = [
            ("MerchantLogin", self.config.merchant_login.as_str()),
            ("OutSum", out_sum.as_str()),
            ("InvoiceID", invoice_id.as_str()),
            ("RecurringId", recurring_id),
            ("Description", "Subscription renewal"),
            ("SignatureValue", signature_value.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.recurring_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Recurring charge request failed");
                CoreError::Provider(e.to_string())
            })?;

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read recurring charge response");
            CoreError::Provider(e.to_string())
        })?;

        debug!(body = %body, "Recurring charge response");

        if body.contains("OK") {
            Ok(ChargeOutcome::Success)
        } else {
            Ok(ChargeOutcome::Declined)
        }
    }
}

//! Payment link construction
//!
//! Builds signed hosted-payment-page URLs and keeps an advisory map of
//! invoices handed out this process lifetime.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::messenger::ChannelMessenger;
use crate::signature;
use crate::tariff;

/// Payment link builder
///
/// The pending map is advisory bookkeeping only: it is in-memory, lost on
/// restart, and never consulted when granting access. The authoritative
/// state transition depends solely on verified callback parameters, which
/// is what makes losing this map harmless.
pub struct PaymentLinkBuilder {
    config: GatewayConfig,
    payment_url: Url,
    pending: Mutex<HashMap<i64, i64>>,
}

impl PaymentLinkBuilder {
    /// Create a new builder; fails if the configured payment page URL is
    /// not a valid URL.
    pub fn new(config: GatewayConfig) -> Result<Self, CoreError> {
        let payment_url = Url::parse(&config.payment_url)
            .map_err(|e| CoreError::Internal(format!("invalid payment URL: {e}")))?;

        Ok(Self {
            config,
            payment_url,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Build a signed hosted-payment-page URL for a user and tariff.
    pub fn payment_url(&self, user_id: i64, months: u32, price: u32) -> String {
        let invoice_id = tariff::invoice_id(user_id, months).to_string();
        let out_sum = format!("{price}.00");
        let description = format!("Channel subscription, {months} mo.");
        let months_field = months.to_string();
        let user_field = user_id.to_string();

        let signature_value = signature::sign_payment_link(
            &self.config.merchant_login,
            &out_sum,
            &invoice_id,
            &self.config.password1,
            &[("Shp_months", &months_field), ("Shp_user", &user_field)],
        );

        let mut url = self.payment_url.clone();
        url.query_pairs_mut()
            .append_pair("MerchantLogin", &self.config.merchant_login)
            .append_pair("OutSum", &out_sum)
            .append_pair("InvId", &invoice_id)
            .append_pair("Description", &description)
            .append_pair("SignatureValue", &signature_value)
            .append_pair("IsTest", if self.config.test_mode { "1" } else { "0" })
            .append_pair("Shp_months", &months_field)
            .append_pair("Shp_user", &user_field);

        url.into()
    }

    /// One signed URL per supported tariff tier, for menu rendering.
    pub fn tariff_links(&self, user_id: i64) -> Vec<(u32, String)> {
        tariff::TARIFF_PRICES
            .iter()
            .map(|&(months, price)| (months, self.payment_url(user_id, months, price)))
            .collect()
    }

    /// Start a payment: build the link, record the pending invoice, and
    /// deliver the link to the user.
    pub async fn start_payment(
        &self,
        messenger: &dyn ChannelMessenger,
        user_id: i64,
        months: u32,
        price: u32,
    ) -> Result<String, CoreError> {
        let url = self.payment_url(user_id, months, price);
        let invoice_id = tariff::invoice_id(user_id, months);

        self.pending.lock().await.insert(invoice_id, user_id);
        info!(user_id = %user_id, months = %months, amount = %price, "Payment link issued");

        messenger
            .send_message(
                user_id,
                &format!("To pay for a {months}-month subscription, follow the link: {url}"),
            )
            .await?;

        Ok(url)
    }

    /// Which user a pending invoice was issued to, if this process issued it
    pub async fn pending_user(&self, invoice_id: i64) -> Option<i64> {
        self.pending.lock().await.get(&invoice_id).copied()
    }
}

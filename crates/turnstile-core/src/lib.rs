//! Turnstile Core - Paid channel access
//!
//! Core logic for selling access to a private messaging channel through a
//! hosted payment gateway: signed payment links, callback verification,
//! subscription lifecycle, and daily renewal sweeps.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_core::{GatewayConfig, PaymentLinkBuilder, SubscriptionService};
//!
//! let config = GatewayConfig::new("shop_login", "pass1", "pass2");
//! let payments = PaymentLinkBuilder::new(config.clone())?;
//!
//! // Hand the user a signed hosted-payment-page URL
//! let url = payments.payment_url(user_id, 3, 3490);
//!
//! // Later, the gateway calls back and the service persists the result
//! let ack = service.confirm_payment(&params).await?;
//! ```

pub mod config;
pub mod error;
pub mod messenger;
pub mod payment;
pub mod recurring;
pub mod renewal;
pub mod service;
pub mod signature;
pub mod tariff;

pub use config::GatewayConfig;
pub use error::CoreError;
pub use messenger::{ChannelMessenger, TelegramMessenger};
pub use payment::PaymentLinkBuilder;
pub use recurring::{ChargeOutcome, RecurringCharger, RobokassaCharger};
pub use renewal::{RenewalSweeper, SweepSummary};
pub use service::{CallbackParams, SubscriptionService};

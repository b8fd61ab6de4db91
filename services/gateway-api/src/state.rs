//! Application state for the Gateway API service.

use std::sync::Arc;

use turnstile_core::{ChannelMessenger, PaymentLinkBuilder, SubscriptionService};
use turnstile_db::pg::PgSubscriptionRepository;
use turnstile_db::DbPool;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription service (callback verification, lifecycle mutations)
    pub service: Arc<SubscriptionService<PgSubscriptionRepository>>,
    /// Payment link builder (signed URLs, advisory pending map)
    pub payments: Arc<PaymentLinkBuilder>,
    /// Messenger (for delivering payment links)
    pub messenger: Arc<dyn ChannelMessenger>,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        service: SubscriptionService<PgSubscriptionRepository>,
        payments: PaymentLinkBuilder,
        messenger: Arc<dyn ChannelMessenger>,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            service: Arc::new(service),
            payments: Arc::new(payments),
            messenger,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

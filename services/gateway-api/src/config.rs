//! Configuration for the Gateway API service.

use std::time::Duration;

use turnstile_core::config::{DEFAULT_PAYMENT_URL, DEFAULT_RECURRING_URL};
use turnstile_core::GatewayConfig;

/// Gateway API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Bot token for the messaging platform
    pub bot_token: String,
    /// Private channel id the subscriptions sell access to
    pub channel_id: i64,
    /// Payment gateway configuration
    pub gateway: GatewayConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Messaging platform
        let bot_token =
            std::env::var("BOT_TOKEN").map_err(|_| ConfigError::Missing("BOT_TOKEN"))?;

        let channel_id = std::env::var("CHANNEL_ID")
            .map_err(|_| ConfigError::Missing("CHANNEL_ID"))?
            .parse()
            .map_err(|_| ConfigError::Invalid("CHANNEL_ID"))?;

        // Payment gateway credentials
        let merchant_login = std::env::var("MERCHANT_LOGIN")
            .map_err(|_| ConfigError::Missing("MERCHANT_LOGIN"))?;

        let password1 = std::env::var("GATEWAY_PASSWORD_1")
            .map_err(|_| ConfigError::Missing("GATEWAY_PASSWORD_1"))?;

        let password2 = std::env::var("GATEWAY_PASSWORD_2")
            .map_err(|_| ConfigError::Missing("GATEWAY_PASSWORD_2"))?;

        let payment_url = std::env::var("GATEWAY_PAYMENT_URL")
            .unwrap_or_else(|_| DEFAULT_PAYMENT_URL.to_string());

        let recurring_url = std::env::var("GATEWAY_RECURRING_URL")
            .unwrap_or_else(|_| DEFAULT_RECURRING_URL.to_string());

        let test_mode = std::env::var("GATEWAY_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let gateway = GatewayConfig::new(&merchant_login, &password1, &password2)
            .with_urls(&payment_url, &recurring_url)
            .with_test_mode(test_mode);

        Ok(Self {
            http_port,
            database_url,
            bot_token,
            channel_id,
            gateway,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

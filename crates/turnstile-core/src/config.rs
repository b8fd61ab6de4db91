//! Gateway configuration

/// Hosted payment page of the gateway
pub const DEFAULT_PAYMENT_URL: &str = "https://auth.robokassa.ru/Merchant/Index.aspx";

/// Recurring-charge endpoint of the gateway
pub const DEFAULT_RECURRING_URL: &str = "https://auth.robokassa.ru/Merchant/Recurring";

/// Payment gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Merchant login registered with the gateway
    pub merchant_login: String,
    /// Password #1: signs outbound links, the recurring request, and the
    /// browser success redirect
    pub password1: String,
    /// Password #2: signs the authoritative server-to-server result callback
    pub password2: String,
    /// Hosted payment page URL
    pub payment_url: String,
    /// Recurring-charge endpoint URL
    pub recurring_url: String,
    /// Whether links are issued against the gateway's test environment
    pub test_mode: bool,
}

impl GatewayConfig {
    /// Create a new gateway config
    pub fn new(
        merchant_login: impl Into<String>,
        password1: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            merchant_login: merchant_login.into(),
            password1: password1.into(),
            password2: password2.into(),
            payment_url: DEFAULT_PAYMENT_URL.to_string(),
            recurring_url: DEFAULT_RECURRING_URL.to_string(),
            test_mode: false,
        }
    }

    /// Override the gateway URLs
    pub fn with_urls(
        mut self,
        payment_url: impl Into<String>,
        recurring_url: impl Into<String>,
    ) -> Self {
        self.payment_url = payment_url.into();
        self.recurring_url = recurring_url.into();
        self
    }

    /// Toggle test mode
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

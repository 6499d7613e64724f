use std::time::Duration;

use log::*;
use onramp_common::Secret;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com/v1";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub publishable_key: String,
    pub webhook_secret: Secret<String>,
    /// Maximum age, in seconds, of a signed webhook timestamp.
    pub webhook_tolerance_secs: i64,
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            publishable_key: String::default(),
            webhook_secret: Secret::default(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("ONRAMP_STRIPE_API_URL").unwrap_or_else(|_| {
            debug!("ONRAMP_STRIPE_API_URL not set, using {DEFAULT_STRIPE_API_URL}");
            DEFAULT_STRIPE_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("ONRAMP_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("ONRAMP_STRIPE_SECRET_KEY not set. Payment intents cannot be created.");
            String::default()
        }));
        let publishable_key = std::env::var("ONRAMP_STRIPE_PUBLISHABLE_KEY").unwrap_or_else(|_| {
            warn!("ONRAMP_STRIPE_PUBLISHABLE_KEY not set. Clients will not be able to load the payment form.");
            String::default()
        });
        let webhook_secret = Secret::new(std::env::var("ONRAMP_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("ONRAMP_STRIPE_WEBHOOK_SECRET not set. Every webhook will be rejected.");
            String::default()
        }));
        let webhook_tolerance_secs = std::env::var("ONRAMP_WEBHOOK_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("Invalid ONRAMP_WEBHOOK_TOLERANCE value '{s}'. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);
        let timeout = std::env::var("ONRAMP_UPSTREAM_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid ONRAMP_UPSTREAM_TIMEOUT_MS value '{s}'. {e}"))
                    .ok()
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { api_url, secret_key, publishable_key, webhook_secret, webhook_tolerance_secs, timeout }
    }

    /// True when both the API secret key and the webhook secret have been provided.
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty() && !self.webhook_secret.is_empty()
    }
}

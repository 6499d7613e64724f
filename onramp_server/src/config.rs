use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use onramp_common::{
    helpers::{parse_boolean_flag, parse_list, parse_optional},
    Secret,
};
use onramp_engine::{db_types::CryptoAsset, price_objects::FeeSchedule, DEFAULT_PRICE_CACHE_TTL};
use rust_decimal::Decimal;
use stripe_tools::StripeConfig;

use crate::errors::ServerError;

const DEFAULT_ONRAMP_HOST: &str = "127.0.0.1";
const DEFAULT_ONRAMP_PORT: u16 = 3000;
const DEFAULT_API_KEY: &str = "dev-api-key-change-in-production";
const DEFAULT_COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("Unknown environment '{s}'")),
        }
    }
}

/// How to determine the caller's IP address when the server runs behind a reverse proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

#[derive(Clone, Debug)]
pub struct PriceFeedConfig {
    pub api_url: String,
    pub api_key: Option<Secret<String>>,
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COINGECKO_API_URL.to_string(),
            api_key: None,
            cache_ttl: DEFAULT_PRICE_CACHE_TTL,
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Shared secret for the admin endpoints, sent by clients in the `x-api-key` header.
    pub api_key: Secret<String>,
    pub proxy: ProxyConfig,
    pub stripe: StripeConfig,
    pub price_feed: PriceFeedConfig,
    pub fees: FeeSchedule,
    /// Assets offered for sale, in display order.
    pub supported_assets: Vec<CryptoAsset>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ONRAMP_HOST.to_string(),
            port: DEFAULT_ONRAMP_PORT,
            environment: Environment::default(),
            api_key: Secret::new(DEFAULT_API_KEY.to_string()),
            proxy: ProxyConfig::default(),
            stripe: StripeConfig::default(),
            price_feed: PriceFeedConfig::default(),
            fees: FeeSchedule::default(),
            supported_assets: CryptoAsset::ALL.to_vec(),
        }
    }
}

/// Reads and parses `name`, logging and falling back to `default` if it is missing or invalid.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match parse_optional::<T>(env::var(name).ok()) {
        Ok(Some(v)) => v,
        Ok(None) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
        Err(e) => {
            warn!("🪛️ {name} {e} Using the default, {default}, instead.");
            default
        },
    }
}

fn parse_supported_assets(value: &str) -> Vec<CryptoAsset> {
    parse_list(value)
        .into_iter()
        .filter_map(|s| {
            s.parse::<CryptoAsset>()
                .map_err(|e| warn!("🪛️ Ignoring entry in ONRAMP_SUPPORTED_CRYPTOS. {e}"))
                .ok()
        })
        .collect()
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("ONRAMP_HOST").ok().unwrap_or_else(|| DEFAULT_ONRAMP_HOST.into());
        let port = env_or_default("ONRAMP_PORT", DEFAULT_ONRAMP_PORT);
        let environment = env_or_default("ONRAMP_ENVIRONMENT", Environment::default());
        let api_key = env::var("ONRAMP_API_KEY").ok().map(Secret::new).unwrap_or_else(|| {
            warn!("🚨️ ONRAMP_API_KEY is not set. The admin endpoints are protected by a well-known default key.");
            Secret::new(DEFAULT_API_KEY.to_string())
        });
        let proxy = ProxyConfig {
            use_x_forwarded_for: parse_boolean_flag(env::var("ONRAMP_USE_X_FORWARDED_FOR").ok(), false),
            use_forwarded: parse_boolean_flag(env::var("ONRAMP_USE_FORWARDED").ok(), false),
        };
        let stripe = StripeConfig::new_from_env_or_default();
        let timeout_ms = env_or_default("ONRAMP_UPSTREAM_TIMEOUT_MS", DEFAULT_UPSTREAM_TIMEOUT.as_millis() as u64);
        let price_feed = PriceFeedConfig {
            api_url: env::var("ONRAMP_COINGECKO_API_URL").unwrap_or_else(|_| DEFAULT_COINGECKO_API_URL.into()),
            api_key: env::var("ONRAMP_COINGECKO_API_KEY").ok().filter(|s| !s.is_empty()).map(Secret::new),
            cache_ttl: Duration::from_secs(env_or_default("ONRAMP_PRICE_CACHE_TTL", DEFAULT_PRICE_CACHE_TTL.as_secs())),
            timeout: Duration::from_millis(timeout_ms),
        };
        let default_fees = FeeSchedule::default();
        let fees = FeeSchedule {
            platform_fee_percent: env_or_default("ONRAMP_PLATFORM_FEE_PERCENT", default_fees.platform_fee_percent),
            min_transaction_usd: env_or_default("ONRAMP_MIN_TRANSACTION_USD", default_fees.min_transaction_usd),
            max_transaction_usd: env_or_default("ONRAMP_MAX_TRANSACTION_USD", default_fees.max_transaction_usd),
        };
        let supported_assets = env::var("ONRAMP_SUPPORTED_CRYPTOS")
            .ok()
            .map(|s| parse_supported_assets(&s))
            .filter(|assets| {
                if assets.is_empty() {
                    warn!("🪛️ ONRAMP_SUPPORTED_CRYPTOS lists no known assets. Offering all of them instead.");
                }
                !assets.is_empty()
            })
            .unwrap_or_else(|| CryptoAsset::ALL.to_vec());
        Self { host, port, environment, api_key, proxy, stripe, price_feed, fees, supported_assets }
    }

    /// Checks settings that cannot be defaulted safely. Missing payment credentials are fatal in production.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.fees.min_transaction_usd > self.fees.max_transaction_usd {
            return Err(ServerError::ConfigurationError(format!(
                "The minimum transaction (${}) is larger than the maximum (${})",
                self.fees.min_transaction_usd, self.fees.max_transaction_usd
            )));
        }
        if self.fees.platform_fee_percent < Decimal::ZERO {
            return Err(ServerError::ConfigurationError("The platform fee cannot be negative".into()));
        }
        if self.environment == Environment::Production {
            if !self.stripe.is_configured() {
                return Err(ServerError::ConfigurationError(
                    "ONRAMP_STRIPE_SECRET_KEY and ONRAMP_STRIPE_WEBHOOK_SECRET must be set in production".into(),
                ));
            }
            if self.api_key.reveal() == DEFAULT_API_KEY {
                warn!("🚨️ The default admin API key is in use in production. Set ONRAMP_API_KEY.");
            }
        }
        Ok(())
    }
}

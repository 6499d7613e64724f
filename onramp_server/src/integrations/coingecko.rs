use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::*;
use onramp_engine::{
    db_types::CryptoAsset,
    price_objects::PriceSnapshot,
    traits::{PriceFeed, PriceFeedError},
};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::PriceFeedConfig;

const PRO_API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// The CoinGecko coin id for each asset.
pub fn coingecko_id(asset: CryptoAsset) -> &'static str {
    match asset {
        CryptoAsset::Btc => "bitcoin",
        CryptoAsset::Eth => "ethereum",
        CryptoAsset::Usdt => "tether",
        CryptoAsset::Usdc => "usd-coin",
        CryptoAsset::Sol => "solana",
        CryptoAsset::Bnb => "binancecoin",
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<Decimal>,
    usd_24h_change: Option<Decimal>,
}

/// A [`PriceFeed`] that reads spot prices from CoinGecko's `simple/price` endpoint.
#[derive(Clone)]
pub struct CoinGeckoFeed {
    base_url: String,
    client: Client,
}

impl CoinGeckoFeed {
    pub fn new(config: &PriceFeedConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_ref() {
            match HeaderValue::from_str(key.reveal()) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(PRO_API_KEY_HEADER, value);
                },
                Err(e) => warn!("💱️ The CoinGecko API key is not a valid header value and will not be sent. {e}"),
            }
        }
        let client = Client::builder().default_headers(headers).timeout(config.timeout).build()?;
        Ok(Self { base_url: config.api_url.trim_end_matches('/').to_string(), client })
    }

    pub fn url_for(&self, asset: CryptoAsset) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url,
            coingecko_id(asset)
        )
    }
}

/// Extracts the snapshot for `asset` from a `simple/price` response body.
pub fn parse_simple_price(asset: CryptoAsset, body: &str, now: DateTime<Utc>) -> Result<PriceSnapshot, PriceFeedError> {
    let malformed = |reason: String| PriceFeedError::MalformedResponse { asset, reason };
    let mut prices = serde_json::from_str::<HashMap<String, SimplePrice>>(body).map_err(|e| malformed(e.to_string()))?;
    let entry =
        prices.remove(coingecko_id(asset)).ok_or_else(|| malformed(format!("No entry for {}", coingecko_id(asset))))?;
    let price_usd = entry.usd.ok_or_else(|| malformed("No USD price given".to_string()))?;
    Ok(PriceSnapshot {
        symbol: asset,
        name: asset.name().to_string(),
        price_usd,
        price_change_24h: entry.usd_24h_change.unwrap_or_default(),
        last_updated: now,
    })
}

impl PriceFeed for CoinGeckoFeed {
    async fn fetch_price(&self, asset: CryptoAsset) -> Result<PriceSnapshot, PriceFeedError> {
        let url = self.url_for(asset);
        trace!("💱️ Fetching {asset} price from {url}");
        let fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                PriceFeedError::Timeout(asset)
            } else {
                PriceFeedError::FetchFailed { asset, reason: e.to_string() }
            }
        };
        let response = self.client.get(&url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            let reason = format!("HTTP {status}");
            warn!("💱️ CoinGecko refused the {asset} price request. {reason}");
            return Err(PriceFeedError::FetchFailed { asset, reason });
        }
        let body = response.text().await.map_err(fetch_error)?;
        let snapshot = parse_simple_price(asset, &body, Utc::now())?;
        debug!("💱️ {asset} is trading at ${}", snapshot.price_usd);
        Ok(snapshot)
    }
}

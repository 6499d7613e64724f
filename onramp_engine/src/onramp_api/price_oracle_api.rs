//! Cached access to upstream prices.
//!
//! Each enabled asset owns a cache slot guarded by its own async mutex. A lookup holds the slot lock for the whole
//! check-fetch-store sequence, so concurrent callers asking for the same asset wait for the first fetch instead of
//! issuing their own, and no caller ever sees a half-written entry. Different assets never block each other.
use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use futures_util::future::try_join_all;
use log::*;
use rust_decimal::Decimal;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    asset_objects::AssetCatalog,
    db_types::CryptoAsset,
    price_objects::PriceSnapshot,
    traits::PriceFeed,
    PriceOracleError,
};

pub const DEFAULT_PRICE_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedPrice {
    snapshot: PriceSnapshot,
    fetched_at: Instant,
}

type PriceSlot = Arc<Mutex<Option<CachedPrice>>>;

pub struct PriceOracleApi<F> {
    feed: F,
    catalog: AssetCatalog,
    cache_ttl: Duration,
    cache: HashMap<CryptoAsset, PriceSlot>,
}

impl<F> Debug for PriceOracleApi<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PriceOracleApi(ttl={}s)", self.cache_ttl.as_secs())
    }
}

impl<F> PriceOracleApi<F> {
    pub fn new(feed: F, catalog: AssetCatalog, cache_ttl: Duration) -> Self {
        let cache = catalog.symbols().into_iter().map(|a| (a, PriceSlot::default())).collect();
        Self { feed, catalog, cache_ttl, cache }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
}

impl<F> PriceOracleApi<F>
where F: PriceFeed
{
    /// Returns the price of `asset`, from cache if the cached value is younger than the TTL, otherwise from the
    /// feed. A failed fetch leaves the cache untouched.
    pub async fn fetch_price(&self, asset: CryptoAsset) -> Result<PriceSnapshot, PriceOracleError> {
        let slot = self.cache.get(&asset).ok_or_else(|| PriceOracleError::UnsupportedAsset(asset.to_string()))?;
        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                trace!("💱️ Using cached {asset} price of ${}", cached.snapshot.price_usd);
                return Ok(cached.snapshot.clone());
            }
        }
        debug!("💱️ Fetching a fresh {asset} price");
        let snapshot = self.feed.fetch_price(asset).await.map_err(|e| {
            warn!("💱️ Could not fetch the {asset} price. {e}");
            PriceOracleError::from(e)
        })?;
        if snapshot.price_usd <= Decimal::ZERO {
            warn!("💱️ The price feed returned a non-positive price for {asset}: {}", snapshot.price_usd);
            return Err(PriceOracleError::InvalidPrice { asset, price: snapshot.price_usd });
        }
        *entry = Some(CachedPrice { snapshot: snapshot.clone(), fetched_at: Instant::now() });
        Ok(snapshot)
    }

    /// Resolves a user-supplied symbol against the catalog and returns its price.
    pub async fn fetch_price_for_symbol(&self, symbol: &str) -> Result<PriceSnapshot, PriceOracleError> {
        let asset = self.catalog.resolve(symbol)?;
        self.fetch_price(asset).await
    }

    /// Fetches several prices concurrently. Fails if any one of them fails.
    pub async fn fetch_prices(&self, assets: &[CryptoAsset]) -> Result<Vec<PriceSnapshot>, PriceOracleError> {
        try_join_all(assets.iter().map(|a| self.fetch_price(*a))).await
    }

    pub async fn fetch_all_prices(&self) -> Result<Vec<PriceSnapshot>, PriceOracleError> {
        self.fetch_prices(&self.catalog.symbols()).await
    }
}

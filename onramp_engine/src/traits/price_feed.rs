use thiserror::Error;

use crate::{db_types::CryptoAsset, price_objects::PriceSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceFeedError {
    #[error("The price provider did not respond in time for {0}")]
    Timeout(CryptoAsset),
    #[error("Could not fetch the price of {asset}. {reason}")]
    FetchFailed { asset: CryptoAsset, reason: String },
    #[error("The price provider returned unusable data for {asset}. {reason}")]
    MalformedResponse { asset: CryptoAsset, reason: String },
}

#[allow(async_fn_in_trait)]
pub trait PriceFeed {
    /// Fetch the current USD price for `asset` from the upstream provider. No caching takes place at this level.
    async fn fetch_price(&self, asset: CryptoAsset) -> Result<PriceSnapshot, PriceFeedError>;
}

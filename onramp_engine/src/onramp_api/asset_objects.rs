use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db_types::{CryptoAsset, UnsupportedAsset};

/// Display and purchase metadata for an asset that is currently offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedAsset {
    pub symbol: CryptoAsset,
    pub name: String,
    pub network: String,
    pub min_purchase: Decimal,
    pub max_purchase: Decimal,
    pub enabled: bool,
}

impl SupportedAsset {
    pub fn for_asset(asset: CryptoAsset) -> Self {
        // purchase limits are in USD
        let (network, min, max) = match asset {
            CryptoAsset::Btc => ("Bitcoin", 10, 50_000),
            CryptoAsset::Eth => ("Ethereum", 10, 50_000),
            CryptoAsset::Usdt | CryptoAsset::Usdc => ("ERC-20", 10, 10_000),
            CryptoAsset::Sol => ("Solana", 10, 10_000),
            CryptoAsset::Bnb => ("BSC", 10, 10_000),
        };
        Self {
            symbol: asset,
            name: asset.name().to_string(),
            network: network.to_string(),
            min_purchase: Decimal::from(min),
            max_purchase: Decimal::from(max),
            enabled: true,
        }
    }
}

/// The set of assets enabled on this deployment, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCatalog {
    assets: Vec<SupportedAsset>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new(&CryptoAsset::ALL)
    }
}

impl AssetCatalog {
    pub fn new(enabled: &[CryptoAsset]) -> Self {
        let mut assets: Vec<SupportedAsset> = Vec::with_capacity(enabled.len());
        for asset in enabled {
            if !assets.iter().any(|a| a.symbol == *asset) {
                assets.push(SupportedAsset::for_asset(*asset));
            }
        }
        Self { assets }
    }

    pub fn supported(&self) -> &[SupportedAsset] {
        &self.assets
    }

    pub fn symbols(&self) -> Vec<CryptoAsset> {
        self.assets.iter().map(|a| a.symbol).collect()
    }

    pub fn get(&self, asset: CryptoAsset) -> Option<&SupportedAsset> {
        self.assets.iter().find(|a| a.symbol == asset)
    }

    pub fn is_supported(&self, asset: CryptoAsset) -> bool {
        self.get(asset).is_some()
    }

    /// Parses `symbol` case-insensitively and checks that the asset is enabled here.
    pub fn resolve(&self, symbol: &str) -> Result<CryptoAsset, UnsupportedAsset> {
        let asset = symbol.parse::<CryptoAsset>()?;
        if self.is_supported(asset) {
            Ok(asset)
        } else {
            Err(UnsupportedAsset(symbol.to_string()))
        }
    }
}

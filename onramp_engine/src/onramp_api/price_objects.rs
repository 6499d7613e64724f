use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db_types::CryptoAsset;

/// The current USD price of an asset, as reported by the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub symbol: CryptoAsset,
    pub name: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: Decimal,
    pub price_change_24h: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// A priced offer to buy `crypto_amount` of an asset for `total_charge` USD.
///
/// `expires_at` is advisory. Orders are always re-priced at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    #[serde(rename = "cryptoSymbol")]
    pub symbol: CryptoAsset,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Decimal,
    pub crypto_amount: Decimal,
    pub current_price: Decimal,
    pub platform_fee: Decimal,
    pub total_charge: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// Fee and limit policy applied to every quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    /// Percentage of the requested USD amount added on top as the platform fee.
    pub platform_fee_percent: Decimal,
    pub min_transaction_usd: Decimal,
    pub max_transaction_usd: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee_percent: Decimal::new(25, 1),
            min_transaction_usd: Decimal::from(10),
            max_transaction_usd: Decimal::from(10_000),
        }
    }
}

impl FeeSchedule {
    pub fn allows(&self, amount_usd: Decimal) -> bool {
        amount_usd >= self.min_transaction_usd && amount_usd <= self.max_transaction_usd
    }

    pub fn fee_for(&self, amount_usd: Decimal) -> Decimal {
        amount_usd * self.platform_fee_percent / Decimal::ONE_HUNDRED
    }
}

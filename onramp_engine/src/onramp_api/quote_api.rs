//! Quote calculation.
//!
//! A quote is computed in this order: the USD amount is checked against the configured limits, the asset is
//! resolved against the catalog, and only then is a price fetched. Requests that fail the cheap checks never reach
//! the price feed.
use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::*;
use rust_decimal::Decimal;

use crate::{
    db_types::CryptoAsset,
    price_objects::{FeeSchedule, PriceQuote},
    traits::PriceFeed,
    PriceOracleApi,
    QuoteError,
};

/// How long a quote is advertised as valid for. Informational only.
pub const QUOTE_VALIDITY: Duration = Duration::minutes(2);

/// Prices `amount_usd` worth of `asset` at `price_usd`. The fee is charged on top of the requested amount, and the
/// crypto amount is derived from the requested amount alone.
pub fn calculate_quote(
    asset: CryptoAsset,
    amount_usd: Decimal,
    price_usd: Decimal,
    fees: &FeeSchedule,
    now: DateTime<Utc>,
) -> Result<PriceQuote, QuoteError> {
    if price_usd <= Decimal::ZERO {
        return Err(QuoteError::InvalidPrice { asset, price: price_usd });
    }
    let platform_fee = fees.fee_for(amount_usd).normalize();
    let total_charge = (amount_usd + platform_fee).normalize();
    let crypto_amount = (amount_usd / price_usd).normalize();
    Ok(PriceQuote {
        symbol: asset,
        amount_usd,
        crypto_amount,
        current_price: price_usd,
        platform_fee,
        total_charge,
        expires_at: now + QUOTE_VALIDITY,
    })
}

pub struct QuoteApi<F> {
    oracle: Arc<PriceOracleApi<F>>,
    fees: FeeSchedule,
}

impl<F> Debug for QuoteApi<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QuoteApi({:?})", self.fees)
    }
}

impl<F> QuoteApi<F> {
    pub fn new(oracle: Arc<PriceOracleApi<F>>, fees: FeeSchedule) -> Self {
        Self { oracle, fees }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn oracle(&self) -> &PriceOracleApi<F> {
        &self.oracle
    }

    pub fn check_amount(&self, amount_usd: Decimal) -> Result<(), QuoteError> {
        if self.fees.allows(amount_usd) {
            Ok(())
        } else {
            Err(QuoteError::AmountOutOfRange {
                amount: amount_usd,
                min: self.fees.min_transaction_usd,
                max: self.fees.max_transaction_usd,
            })
        }
    }

    pub fn resolve_asset(&self, symbol: &str) -> Result<CryptoAsset, QuoteError> {
        Ok(self.oracle.catalog().resolve(symbol)?)
    }
}

impl<F> QuoteApi<F>
where F: PriceFeed
{
    /// Quotes `amount_usd` worth of the asset named by `symbol`.
    pub async fn quote(&self, symbol: &str, amount_usd: Decimal, now: DateTime<Utc>) -> Result<PriceQuote, QuoteError> {
        self.check_amount(amount_usd)?;
        let asset = self.resolve_asset(symbol)?;
        self.quote_asset(asset, amount_usd, now).await
    }

    /// Quotes an already-resolved asset. The amount limits are still enforced.
    pub async fn quote_asset(
        &self,
        asset: CryptoAsset,
        amount_usd: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PriceQuote, QuoteError> {
        self.check_amount(amount_usd)?;
        let snapshot = self.oracle.fetch_price(asset).await?;
        let quote = calculate_quote(asset, amount_usd, snapshot.price_usd, &self.fees, now)?;
        debug!(
            "🧾️ Quoted {} {asset} for ${} (fee ${}) at ${}",
            quote.crypto_amount, quote.total_charge, quote.platform_fee, quote.current_price
        );
        Ok(quote)
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use crate::db_types::CryptoAsset;

static BTC_LEGACY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$").unwrap());
static BTC_BECH32: Lazy<Regex> = Lazy::new(|| Regex::new(r"^bc1[a-z0-9]{39,59}$").unwrap());
static EVM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());
static SOLANA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap());
static BNB_BECH32: Lazy<Regex> = Lazy::new(|| Regex::new(r"^bnb1[a-z0-9]{38}$").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Checks the shape of a destination address for `asset`. This is a format check only; it does not prove the
/// address exists on chain.
pub fn is_valid_wallet_address(asset: CryptoAsset, address: &str) -> bool {
    match asset {
        CryptoAsset::Btc => BTC_LEGACY.is_match(address) || BTC_BECH32.is_match(address),
        CryptoAsset::Eth | CryptoAsset::Usdt | CryptoAsset::Usdc => EVM.is_match(address),
        CryptoAsset::Sol => SOLANA.is_match(address),
        CryptoAsset::Bnb => EVM.is_match(address) || BNB_BECH32.is_match(address),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

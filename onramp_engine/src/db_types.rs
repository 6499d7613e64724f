use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------     CryptoAsset       ---------------------------------------------------------
/// The closed set of crypto assets the onramp knows how to price and deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CryptoAsset {
    Btc,
    Eth,
    Usdt,
    Usdc,
    Sol,
    Bnb,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cryptocurrency {0} is not supported")]
pub struct UnsupportedAsset(pub String);

impl CryptoAsset {
    pub const ALL: [CryptoAsset; 6] =
        [CryptoAsset::Btc, CryptoAsset::Eth, CryptoAsset::Usdt, CryptoAsset::Usdc, CryptoAsset::Sol, CryptoAsset::Bnb];

    pub fn symbol(&self) -> &'static str {
        match self {
            CryptoAsset::Btc => "BTC",
            CryptoAsset::Eth => "ETH",
            CryptoAsset::Usdt => "USDT",
            CryptoAsset::Usdc => "USDC",
            CryptoAsset::Sol => "SOL",
            CryptoAsset::Bnb => "BNB",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CryptoAsset::Btc => "Bitcoin",
            CryptoAsset::Eth => "Ethereum",
            CryptoAsset::Usdt => "Tether",
            CryptoAsset::Usdc => "USD Coin",
            CryptoAsset::Sol => "Solana",
            CryptoAsset::Bnb => "BNB",
        }
    }
}

impl Display for CryptoAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for CryptoAsset {
    type Err = UnsupportedAsset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim().to_ascii_uppercase();
        CryptoAsset::ALL.into_iter().find(|a| a.symbol() == symbol).ok_or_else(|| UnsupportedAsset(s.to_string()))
    }
}

//--------------------------------------       OrderId         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh, globally unique order id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and a payment intent opened, but no payment outcome is known yet.
    Pending,
    /// The payment processor has reported success and the order is being settled.
    Processing,
    /// The payment has been captured and the order is settled.
    Completed,
    /// The payment failed or was canceled.
    Failed,
    /// The charge was refunded by an administrator.
    Refunded,
}

impl OrderStatusType {
    /// The legal edges of the order state machine. Anything not listed here is rejected by the ledger.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Processing) |
                (Pending, Failed) |
                (Processing, Completed) |
                (Processing, Failed) |
                (Processing, Refunded) |
                (Completed, Refunded)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Failed => write!(f, "failed"),
            OrderStatusType::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct InvalidOrderStatus(String);

impl FromStr for OrderStatusType {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(InvalidOrderStatus(s.to_string())),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// A fully priced order, tied to a freshly opened payment intent, that is ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub symbol: CryptoAsset,
    pub crypto_amount: Decimal,
    pub fiat_amount: Decimal,
    pub price_at_purchase: Decimal,
    pub platform_fee: Decimal,
    pub total_charged: Decimal,
    pub customer_email: String,
    pub wallet_address: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "cryptoSymbol")]
    pub symbol: CryptoAsset,
    pub crypto_amount: Decimal,
    pub fiat_amount: Decimal,
    pub price_at_purchase: Decimal,
    pub platform_fee: Decimal,
    pub total_charged: Decimal,
    pub customer_email: String,
    pub wallet_address: String,
    pub status: OrderStatusType,
    pub payment_intent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_refunded: Option<Decimal>,
}

impl From<NewOrder> for Order {
    fn from(order: NewOrder) -> Self {
        Self {
            id: order.id,
            symbol: order.symbol,
            crypto_amount: order.crypto_amount,
            fiat_amount: order.fiat_amount,
            price_at_purchase: order.price_at_purchase,
            platform_fee: order.platform_fee,
            total_charged: order.total_charged,
            customer_email: order.customer_email,
            wallet_address: order.wallet_address,
            status: OrderStatusType::Pending,
            payment_intent_id: order.payment_intent_id,
            payment_method: order.payment_method,
            created_at: order.created_at,
            updated_at: order.created_at,
            completed_at: None,
            amount_refunded: None,
        }
    }
}

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    db_types::{CryptoAsset, OrderId, OrderStatusType, UnsupportedAsset},
    traits::{GatewayError, OrderManagementError, PriceFeedError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceOracleError {
    #[error("Cryptocurrency {0} is not supported")]
    UnsupportedAsset(String),
    #[error("Invalid price received for {asset}: {price}")]
    InvalidPrice { asset: CryptoAsset, price: Decimal },
    #[error(transparent)]
    Feed(#[from] PriceFeedError),
}

impl From<UnsupportedAsset> for PriceOracleError {
    fn from(e: UnsupportedAsset) -> Self {
        Self::UnsupportedAsset(e.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Amount ${amount} is outside the permitted range of ${min} to ${max}")]
    AmountOutOfRange { amount: Decimal, min: Decimal, max: Decimal },
    #[error("Cryptocurrency {0} is not supported")]
    UnsupportedAsset(String),
    #[error("Invalid price received for {asset}: {price}")]
    InvalidPrice { asset: CryptoAsset, price: Decimal },
    #[error(transparent)]
    PriceFeed(#[from] PriceFeedError),
}

impl From<UnsupportedAsset> for QuoteError {
    fn from(e: UnsupportedAsset) -> Self {
        Self::UnsupportedAsset(e.0)
    }
}

impl From<PriceOracleError> for QuoteError {
    fn from(e: PriceOracleError) -> Self {
        match e {
            PriceOracleError::UnsupportedAsset(s) => Self::UnsupportedAsset(s),
            PriceOracleError::InvalidPrice { asset, price } => Self::InvalidPrice { asset, price },
            PriceOracleError::Feed(e) => Self::PriceFeed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error("Invalid {asset} wallet address: {address}")]
    InvalidWalletAddress { asset: CryptoAsset, address: String },
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot be refunded while it is {status}")]
    NotRefundable { order_id: OrderId, status: OrderStatusType },
    #[error("Refund of ${requested} exceeds the ${charged} charged for order {order_id}")]
    RefundExceedsCharge { order_id: OrderId, requested: Decimal, charged: Decimal },
    #[error(transparent)]
    Store(#[from] OrderManagementError),
}

impl From<UnsupportedAsset> for OrderFlowError {
    fn from(e: UnsupportedAsset) -> Self {
        Self::Quote(e.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("No order is linked to payment intent {0}")]
    OrderNotFound(String),
    #[error("Event {0} does not reference a payment intent")]
    MissingIntentReference(String),
    #[error(transparent)]
    Store(#[from] OrderManagementError),
}

impl ReconcileError {
    /// True when the event contradicts the order's current state, e.g. a success notice for a failed order.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, ReconcileError::Store(OrderManagementError::InvalidTransition { .. }))
    }
}

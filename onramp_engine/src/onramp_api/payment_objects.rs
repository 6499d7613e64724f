use chrono::{DateTime, Utc};
use onramp_common::{Cents, Secret};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CryptoAsset, OrderId},
    price_objects::PriceQuote,
};

/// Order details attached to a payment intent, so that processor notifications can be traced back to the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    pub order_id: OrderId,
    pub symbol: CryptoAsset,
    pub crypto_amount: Decimal,
    pub wallet_address: String,
}

impl IntentMetadata {
    pub fn new(order_id: OrderId, quote: &PriceQuote, wallet_address: &str) -> Self {
        Self {
            order_id,
            symbol: quote.symbol,
            crypto_amount: quote.crypto_amount,
            wallet_address: wallet_address.to_string(),
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("orderId".to_string(), self.order_id.to_string()),
            ("cryptoSymbol".to_string(), self.symbol.to_string()),
            ("cryptoAmount".to_string(), self.crypto_amount.to_string()),
            ("walletAddress".to_string(), self.wallet_address.clone()),
        ]
    }
}

/// A payment intent as seen by the engine. The client secret is only ever handed to the paying customer.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Secret<String>,
    pub amount: Cents,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    Duplicate,
    Fraudulent,
    RequestedByCustomer,
}

impl RefundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundReason::Duplicate => "duplicate",
            RefundReason::Fraudulent => "fraudulent",
            RefundReason::RequestedByCustomer => "requested_by_customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRecord {
    pub id: String,
    pub payment_intent_id: String,
    pub amount: Cents,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RefundReason>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentSucceeded,
    PaymentFailed,
    PaymentCanceled,
    ChargeRefunded,
    /// Any event type the engine does not act on. The raw type name is kept for logging.
    Other(String),
}

/// An authenticated notification from the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEvent {
    pub id: String,
    pub kind: GatewayEventKind,
    /// The id of the object the event is about (a payment intent or a charge).
    pub object_id: String,
    /// For charge events, the payment intent the charge belongs to.
    pub payment_intent_id: Option<String>,
    pub amount_refunded: Option<Cents>,
    pub created_at: DateTime<Utc>,
}

impl GatewayEvent {
    /// The payment intent this event refers to, if any.
    pub fn intent_id(&self) -> Option<&str> {
        match self.kind {
            GatewayEventKind::PaymentSucceeded | GatewayEventKind::PaymentFailed | GatewayEventKind::PaymentCanceled => {
                Some(self.object_id.as_str())
            },
            _ => self.payment_intent_id.as_deref(),
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, PaymentMethod},
    payment_objects::{RefundReason, RefundRecord},
};

/// A customer's request to buy crypto. The symbol is raw user input and is resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub amount_usd: Decimal,
    pub customer_email: String,
    pub wallet_address: String,
    pub payment_method: Option<PaymentMethod>,
}

/// The result of a successful order creation: the stored order, and the secret the customer needs to complete the
/// card payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResult {
    pub order: Order,
    pub client_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefundRequest {
    /// Partial refund amount. The full charge is refunded when absent.
    pub amount_usd: Option<Decimal>,
    pub reason: Option<RefundReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub order: Order,
    pub refund: RefundRecord,
}

//! Request and response bodies for the HTTP API.
//!
//! Request bodies are validated here, before anything reaches the engine. Field names follow the camelCase
//! convention of the public API.
use onramp_engine::{
    db_types::PaymentMethod,
    helpers::is_valid_email,
    order_objects::{OrderRequest, RefundRequest},
    payment_objects::RefundReason,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MIN_WALLET_ADDRESS_LENGTH: usize = 10;

/// The envelope for every successful API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

fn validate_symbol(symbol: &str) -> Result<String, ServerError> {
    let symbol = symbol.trim();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LENGTH {
        return Err(ServerError::ValidationError(format!(
            "Crypto symbol must be between 1 and {MAX_SYMBOL_LENGTH} characters"
        )));
    }
    Ok(symbol.to_ascii_uppercase())
}

fn validate_amount(amount: Decimal) -> Result<Decimal, ServerError> {
    if amount <= Decimal::ZERO {
        return Err(ServerError::ValidationError("Amount must be a positive number".into()));
    }
    Ok(amount)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    #[serde(alias = "cryptoSymbol")]
    pub symbol: String,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Decimal,
}

impl QuoteRequest {
    /// Returns the upper-cased symbol and the amount, if both pass basic validation.
    pub fn validate(&self) -> Result<(String, Decimal), ServerError> {
        Ok((validate_symbol(&self.symbol)?, validate_amount(self.amount_usd)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(alias = "cryptoSymbol")]
    pub symbol: String,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Decimal,
    pub customer_email: String,
    pub wallet_address: String,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl CreateOrderRequest {
    pub fn validate(self) -> Result<OrderRequest, ServerError> {
        let symbol = validate_symbol(&self.symbol)?;
        let amount_usd = validate_amount(self.amount_usd)?;
        let customer_email = self.customer_email.trim().to_string();
        if !is_valid_email(&customer_email) {
            return Err(ServerError::ValidationError("Valid email is required".into()));
        }
        let wallet_address = self.wallet_address.trim().to_string();
        if wallet_address.len() < MIN_WALLET_ADDRESS_LENGTH {
            return Err(ServerError::ValidationError("Valid wallet address is required".into()));
        }
        Ok(OrderRequest {
            symbol,
            amount_usd,
            customer_email,
            wallet_address,
            payment_method: Some(self.payment_method.unwrap_or_default()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundParams {
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<RefundReason>,
}

impl RefundParams {
    pub fn validate(self) -> Result<RefundRequest, ServerError> {
        let amount_usd = self.amount_usd.map(validate_amount).transpose()?;
        Ok(RefundRequest { amount_usd, reason: self.reason })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchQuery {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { success: true, received: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    pub publishable_key: String,
}

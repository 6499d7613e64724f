use rust_decimal::Decimal;
use thiserror::Error;

use crate::payment_objects::{GatewayEvent, IntentMetadata, PaymentIntent, RefundReason, RefundRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The payment processor did not respond in time. {0}")]
    Timeout(String),
    #[error("The payment processor request failed. {0}")]
    RequestFailed(String),
    #[error("The payment processor rejected the request ({status}). {message}")]
    Rejected { status: u16, message: String },
    #[error("Amount cannot be charged: {0}")]
    InvalidAmount(String),
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(String),
    #[error("Could not interpret the payment processor payload. {0}")]
    MalformedPayload(String),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// The contract the engine needs from a card payment processor.
///
/// Amounts are given in USD and converted to the processor's minor unit by the implementation.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a payment intent for `amount_usd`, tagged with the order metadata so that later notifications can be
    /// matched back to the order.
    async fn create_intent(
        &self,
        amount_usd: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    /// Refunds the charge behind `intent_id`. When `amount_usd` is `None`, the full charge is refunded.
    async fn create_refund(
        &self,
        intent_id: &str,
        amount_usd: Option<Decimal>,
        reason: Option<RefundReason>,
    ) -> Result<RefundRecord, GatewayError>;

    /// Authenticates a raw notification body against its signature header and decodes it. Nothing may be derived
    /// from a payload that fails verification.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
}

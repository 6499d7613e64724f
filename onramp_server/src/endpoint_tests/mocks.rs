use mockall::mock;
use onramp_engine::{
    db_types::CryptoAsset,
    payment_objects::{GatewayEvent, IntentMetadata, PaymentIntent, RefundReason, RefundRecord},
    price_objects::PriceSnapshot,
    traits::{GatewayError, PaymentGateway, PriceFeed, PriceFeedError},
};
use rust_decimal::Decimal;

mock! {
    pub Feed {}
    impl PriceFeed for Feed {
        async fn fetch_price(&self, asset: CryptoAsset) -> Result<PriceSnapshot, PriceFeedError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_intent(&self, amount_usd: Decimal, currency: &str, metadata: IntentMetadata) -> Result<PaymentIntent, GatewayError>;
        async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;
        async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;
        async fn create_refund(&self, intent_id: &str, amount_usd: Option<Decimal>, reason: Option<RefundReason>) -> Result<RefundRecord, GatewayError>;
        fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
    }
}

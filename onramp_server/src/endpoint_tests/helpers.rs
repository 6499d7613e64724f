use std::str::FromStr;

use actix_web::{http::StatusCode, test, test::TestRequest, App};
use chrono::Utc;
use log::debug;
use onramp_common::{Cents, Secret};
use onramp_engine::{
    db_types::{CryptoAsset, NewOrder, Order, OrderId, PaymentMethod},
    events::EventProducers,
    payment_objects::PaymentIntent,
    price_objects::PriceSnapshot,
    traits::{OrderManagement, PaymentGateway, PriceFeed},
    InMemoryDatabase,
};
use rust_decimal::Decimal;
use serde_json::Value;
use stripe_tools::StripeConfig;

use super::mocks::MockFeed;
use crate::{
    config::{Environment, ServerConfig},
    middleware::API_KEY_HEADER,
    server::OnrampServices,
};

pub const TEST_API_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";
pub const PUBLISHABLE_KEY: &str = "pk_test_123";
pub const ETH_WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        environment: Environment::Test,
        api_key: Secret::new(TEST_API_KEY.to_string()),
        stripe: StripeConfig {
            publishable_key: PUBLISHABLE_KEY.to_string(),
            webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn services<G: PaymentGateway + 'static>(
    db: InMemoryDatabase,
    gateway: G,
    feed: MockFeed,
) -> OnrampServices<InMemoryDatabase, G, MockFeed> {
    let _ = env_logger::try_init();
    OnrampServices::new(&test_config(), db, gateway, feed, EventProducers::default())
}

/// Sends the request through a freshly built app and returns the status and the JSON body (`Null` if the body is
/// not JSON).
pub async fn send<B, G, F>(services: &OnrampServices<B, G, F>, req: TestRequest) -> (StatusCode, Value)
where
    B: OrderManagement + 'static,
    G: PaymentGateway + 'static,
    F: PriceFeed + 'static,
{
    let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    debug!("Response: {status} {json}");
    (status, json)
}

pub fn with_api_key(req: TestRequest, key: &str) -> TestRequest {
    req.insert_header((API_KEY_HEADER, key))
}

pub fn feed_at(price: Decimal) -> MockFeed {
    let mut feed = MockFeed::new();
    feed.expect_fetch_price().returning(move |asset| Ok(snapshot(asset, price)));
    feed
}

pub fn snapshot(asset: CryptoAsset, price: Decimal) -> PriceSnapshot {
    PriceSnapshot {
        symbol: asset,
        name: asset.name().to_string(),
        price_usd: price,
        price_change_24h: Decimal::ONE,
        last_updated: Utc::now(),
    }
}

pub fn intent(id: &str, amount: Decimal) -> PaymentIntent {
    PaymentIntent {
        id: id.to_string(),
        client_secret: Secret::new(format!("{id}_secret_xyz")),
        amount: Cents::from_usd(amount).unwrap(),
        currency: "USD".to_string(),
        status: "requires_payment_method".to_string(),
    }
}

/// Writes a pending ETH order for `intent_id` straight into the ledger.
pub async fn seed_order(db: &InMemoryDatabase, intent_id: &str) -> Order {
    let order = NewOrder {
        id: OrderId::random(),
        symbol: CryptoAsset::Eth,
        crypto_amount: Decimal::from_str("0.05").unwrap(),
        fiat_amount: Decimal::from(150),
        price_at_purchase: Decimal::from(3000),
        platform_fee: Decimal::from_str("3.75").unwrap(),
        total_charged: Decimal::from_str("153.75").unwrap(),
        customer_email: "alice@example.com".to_string(),
        wallet_address: ETH_WALLET.to_string(),
        payment_method: Some(PaymentMethod::Card),
        payment_intent_id: intent_id.to_string(),
        created_at: Utc::now(),
    };
    db.insert_order(order).await.unwrap()
}

pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

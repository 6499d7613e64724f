#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use log::*;
use onramp_common::{Cents, Secret};
use onramp_engine::{
    asset_objects::AssetCatalog,
    db_types::CryptoAsset,
    events::EventProducers,
    payment_objects::{GatewayEvent, GatewayEventKind, IntentMetadata, PaymentIntent, RefundReason, RefundRecord},
    price_objects::{FeeSchedule, PriceSnapshot},
    helpers::KeyedLocks,
    traits::{GatewayError, PaymentGateway, PriceFeed, PriceFeedError},
    InMemoryDatabase,
    OrderFlowApi,
    PriceOracleApi,
    QuoteApi,
    ReconcilerApi,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

pub const WEBHOOK_SIGNATURE: &str = "t=1700000000,v1=test";

pub fn prepare_test_env() {
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// A price feed with fixed prices that counts how often it is asked.
#[derive(Clone, Default)]
pub struct StaticFeed {
    prices: HashMap<CryptoAsset, Decimal>,
    calls: Arc<AtomicUsize>,
}

impl StaticFeed {
    pub fn with_price(mut self, asset: CryptoAsset, price: Decimal) -> Self {
        self.prices.insert(asset, price);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceFeed for StaticFeed {
    async fn fetch_price(&self, asset: CryptoAsset) -> Result<PriceSnapshot, PriceFeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let price = self
            .prices
            .get(&asset)
            .copied()
            .ok_or_else(|| PriceFeedError::FetchFailed { asset, reason: "no price configured".into() })?;
        Ok(PriceSnapshot {
            symbol: asset,
            name: asset.name().into(),
            price_usd: price,
            price_change_24h: Decimal::ZERO,
            last_updated: Utc::now(),
        })
    }
}

/// An in-process payment processor. Intents get sequential ids, and webhook payloads are plain
/// `<event type> <object id>` strings signed with [`WEBHOOK_SIGNATURE`].
#[derive(Default)]
pub struct FakeGateway {
    next_id: AtomicUsize,
    pub intents: Mutex<Vec<(String, Decimal, IntentMetadata)>>,
    pub refunds: Mutex<Vec<RefundRecord>>,
}

impl FakeGateway {
    pub fn payload(event_type: &str, intent_id: &str) -> Vec<u8> {
        format!("{event_type} {intent_id}").into_bytes()
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_intent(
        &self,
        amount_usd: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("pi_test_{n}");
        // give concurrent callers a chance to interleave
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.intents.lock().await.push((id.clone(), amount_usd, metadata));
        let amount = Cents::from_usd(amount_usd).map_err(|e| GatewayError::InvalidAmount(e.to_string()))?;
        Ok(PaymentIntent {
            id: id.clone(),
            client_secret: Secret::new(format!("{id}_secret")),
            amount,
            currency: currency.to_string(),
            status: "requires_payment_method".into(),
        })
    }

    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        Err(GatewayError::Rejected { status: 404, message: format!("No such payment_intent: {intent_id}") })
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.fetch_intent(intent_id).await
    }

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_usd: Option<Decimal>,
        reason: Option<RefundReason>,
    ) -> Result<RefundRecord, GatewayError> {
        let charged = self
            .intents
            .lock()
            .await
            .iter()
            .find(|(id, _, _)| id == intent_id)
            .map(|(_, amount, _)| *amount)
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                message: format!("No such payment_intent: {intent_id}"),
            })?;
        let amount =
            Cents::from_usd(amount_usd.unwrap_or(charged)).map_err(|e| GatewayError::InvalidAmount(e.to_string()))?;
        // a real processor round trip; lets a racing caller run in between
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut refunds = self.refunds.lock().await;
        let refund = RefundRecord {
            id: format!("re_{intent_id}_{}", refunds.len()),
            payment_intent_id: intent_id.to_string(),
            amount,
            status: "succeeded".into(),
            reason,
        };
        refunds.push(refund.clone());
        Ok(refund)
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        if signature != WEBHOOK_SIGNATURE {
            return Err(GatewayError::InvalidSignature("signature mismatch".into()));
        }
        let body = std::str::from_utf8(payload).map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;
        let (event_type, object_id) =
            body.split_once(' ').ok_or_else(|| GatewayError::MalformedPayload(body.to_string()))?;
        let kind = match event_type {
            "payment_intent.succeeded" => GatewayEventKind::PaymentSucceeded,
            "payment_intent.payment_failed" => GatewayEventKind::PaymentFailed,
            "payment_intent.canceled" => GatewayEventKind::PaymentCanceled,
            "charge.refunded" => GatewayEventKind::ChargeRefunded,
            other => GatewayEventKind::Other(other.to_string()),
        };
        Ok(GatewayEvent {
            id: format!("evt_{object_id}"),
            kind,
            object_id: object_id.to_string(),
            payment_intent_id: None,
            amount_refunded: None,
            created_at: Utc::now(),
        })
    }
}

pub struct TestEngine {
    pub feed: StaticFeed,
    pub gateway: Arc<FakeGateway>,
    pub orders: OrderFlowApi<InMemoryDatabase, FakeGateway, StaticFeed>,
    pub reconciler: ReconcilerApi<InMemoryDatabase>,
    pub quotes: Arc<QuoteApi<StaticFeed>>,
}

impl TestEngine {
    pub fn new(producers: EventProducers) -> Self {
        let feed = StaticFeed::default()
            .with_price(CryptoAsset::Btc, Decimal::from(50_000))
            .with_price(CryptoAsset::Eth, Decimal::from(3_000))
            .with_price(CryptoAsset::Usdc, Decimal::ONE);
        let oracle = PriceOracleApi::new(feed.clone(), AssetCatalog::default(), Duration::from_secs(60));
        let quotes = Arc::new(QuoteApi::new(Arc::new(oracle), FeeSchedule::default()));
        let db = InMemoryDatabase::new();
        let gateway = Arc::new(FakeGateway::default());
        let intent_locks = Arc::new(KeyedLocks::default());
        let orders = OrderFlowApi::new(
            db.clone(),
            Arc::clone(&gateway),
            Arc::clone(&quotes),
            Arc::clone(&intent_locks),
            producers.clone(),
        );
        let reconciler = ReconcilerApi::new(db, intent_locks, producers);
        Self { feed, gateway, orders, reconciler, quotes }
    }

    pub async fn deliver(&self, event_type: &str, intent_id: &str) -> GatewayEvent {
        let payload = FakeGateway::payload(event_type, intent_id);
        self.gateway.verify_webhook(&payload, WEBHOOK_SIGNATURE).expect("webhook should verify")
    }
}

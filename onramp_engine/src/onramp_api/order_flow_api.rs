use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;
use onramp_common::USD_CURRENCY_CODE;
use rust_decimal::Decimal;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderRefundedEvent},
    helpers::{is_valid_email, is_valid_wallet_address, KeyedLocks},
    order_objects::{NewOrderResult, OrderRequest, RefundRequest, RefundResult},
    payment_objects::IntentMetadata,
    traits::{OrderManagement, PaymentGateway, PriceFeed},
    OrderFlowError,
    QuoteApi,
};

/// `OrderFlowApi` is the primary API for turning a customer's purchase request into an order backed by a payment
/// intent, and for administrative refunds of those orders.
pub struct OrderFlowApi<B, G, F> {
    db: B,
    gateway: Arc<G>,
    quotes: Arc<QuoteApi<F>>,
    intent_locks: Arc<KeyedLocks<String>>,
    producers: EventProducers,
}

impl<B, G, F> Debug for OrderFlowApi<B, G, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G, F> OrderFlowApi<B, G, F> {
    /// `intent_locks` must be the same set the [`crate::ReconcilerApi`] uses, so that refunds and payment
    /// notifications for one intent never interleave.
    pub fn new(
        db: B,
        gateway: Arc<G>,
        quotes: Arc<QuoteApi<F>>,
        intent_locks: Arc<KeyedLocks<String>>,
        producers: EventProducers,
    ) -> Self {
        Self { db, gateway, quotes, intent_locks, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G, F> OrderFlowApi<B, G, F>
where
    B: OrderManagement,
    G: PaymentGateway,
    F: PriceFeed,
{
    /// Creates an order for the request.
    ///
    /// The request is always re-priced; earlier quotes are not honoured. The payment intent is opened for the full
    /// amount including fees, and the order is only written to the ledger once the intent exists. If the payment
    /// processor fails, nothing is stored.
    pub async fn create_order(&self, request: OrderRequest) -> Result<NewOrderResult, OrderFlowError> {
        if !is_valid_email(&request.customer_email) {
            return Err(OrderFlowError::ValidationError(format!("Invalid email address: {}", request.customer_email)));
        }
        self.quotes.check_amount(request.amount_usd)?;
        let asset = self.quotes.resolve_asset(&request.symbol)?;
        if !is_valid_wallet_address(asset, &request.wallet_address) {
            return Err(OrderFlowError::InvalidWalletAddress { asset, address: request.wallet_address });
        }
        let now = Utc::now();
        let quote = self.quotes.quote_asset(asset, request.amount_usd, now).await?;

        let order_id = OrderId::random();
        let metadata = IntentMetadata::new(order_id.clone(), &quote, &request.wallet_address);
        let intent =
            self.gateway.create_intent(quote.total_charge, USD_CURRENCY_CODE, metadata).await.map_err(|e| {
                warn!("🔄️📦️ Could not open a payment intent for order {order_id}. {e}");
                e
            })?;
        let new_order = NewOrder {
            id: order_id,
            symbol: asset,
            crypto_amount: quote.crypto_amount,
            fiat_amount: quote.amount_usd,
            price_at_purchase: quote.current_price,
            platform_fee: quote.platform_fee,
            total_charged: quote.total_charge,
            customer_email: request.customer_email,
            wallet_address: request.wallet_address,
            payment_method: request.payment_method,
            payment_intent_id: intent.id.clone(),
            created_at: now,
        };
        let order = self.db.insert_order(new_order).await.map_err(|e| {
            error!("🔄️📦️ Payment intent {} was opened but its order could not be stored. {e}", intent.id);
            e
        })?;
        info!(
            "🔄️📦️ Order {} created: {} {} for ${} (intent {})",
            order.id, order.crypto_amount, order.symbol, order.total_charged, order.payment_intent_id
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(NewOrderResult { order, client_secret: intent.client_secret.reveal().clone() })
    }

    /// Refunds an order through the payment processor and marks it as refunded.
    ///
    /// Only orders whose payment has succeeded (`processing` or `completed`) can be refunded. The order's intent lock
    /// is held from the status check until the refund is recorded, so a second refund request for the same order sees
    /// it as `refunded` and never reaches the payment processor.
    pub async fn refund_order(&self, order_id: &OrderId, request: RefundRequest) -> Result<RefundResult, OrderFlowError> {
        let intent_id = self.fetch_order(order_id).await?.payment_intent_id;
        let _guard = self.intent_locks.lock(&intent_id).await;
        let order = self.fetch_order(order_id).await?;
        if !order.status.can_transition_to(OrderStatusType::Refunded) {
            return Err(OrderFlowError::NotRefundable { order_id: order.id, status: order.status });
        }
        if let Some(amount) = request.amount_usd {
            if amount <= Decimal::ZERO {
                return Err(OrderFlowError::ValidationError("Refund amount must be positive".into()));
            }
            if amount > order.total_charged {
                return Err(OrderFlowError::RefundExceedsCharge {
                    order_id: order.id,
                    requested: amount,
                    charged: order.total_charged,
                });
            }
        }
        let refund = self.gateway.create_refund(&order.payment_intent_id, request.amount_usd, request.reason).await?;
        let order = self.db.record_refund(&order.id, refund.amount.to_usd()).await?;
        info!("🔄️📦️ Order {} refunded {} (refund {})", order.id, refund.amount, refund.id);
        self.producers.publish_order_refunded(OrderRefundedEvent::new(order.clone(), refund.clone())).await;
        Ok(RefundResult { order, refund })
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_id(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }
}

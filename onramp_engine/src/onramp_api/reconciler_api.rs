//! Applies authenticated payment-processor notifications to orders.
//!
//! Notifications may arrive more than once, out of order, and concurrently for the same payment intent. All work for
//! one intent is serialized through a per-intent lock, and a notification whose outcome is already reflected on the
//! order is acknowledged without changing it.
use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Order, OrderStatusType},
    events::{EventProducers, OrderCompletedEvent, OrderFailedEvent},
    helpers::KeyedLocks,
    payment_objects::{GatewayEvent, GatewayEventKind},
    traits::{OrderManagement, OrderManagementError},
    ReconcileError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order was moved to `completed`.
    Completed(Order),
    /// The order was moved to `failed`.
    Failed(Order),
    /// The order already reflected this notification; nothing changed.
    AlreadyApplied(Order),
    /// A refund notification was received. Refund state is owned by the admin refund flow, so it is only logged.
    RefundNoted { charge_id: String },
    /// The event type is not one the engine acts on.
    Ignored(String),
}

pub struct ReconcilerApi<B> {
    db: B,
    locks: Arc<KeyedLocks<String>>,
    producers: EventProducers,
}

impl<B> Debug for ReconcilerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcilerApi")
    }
}

impl<B> ReconcilerApi<B>
where B: OrderManagement
{
    pub fn new(db: B, locks: Arc<KeyedLocks<String>>, producers: EventProducers) -> Self {
        Self { db, locks, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn reconcile(&self, event: GatewayEvent) -> Result<ReconcileOutcome, ReconcileError> {
        debug!("🧮️ Reconciling event {} ({:?})", event.id, event.kind);
        match &event.kind {
            GatewayEventKind::PaymentSucceeded => {
                let intent_id = self.intent_for(&event)?;
                self.process_payment_success(intent_id).await
            },
            GatewayEventKind::PaymentFailed | GatewayEventKind::PaymentCanceled => {
                let intent_id = self.intent_for(&event)?;
                let reason = match event.kind {
                    GatewayEventKind::PaymentCanceled => "payment canceled",
                    _ => "payment failed",
                };
                self.process_payment_failure(intent_id, reason).await
            },
            GatewayEventKind::ChargeRefunded => {
                let refunded = event.amount_refunded.map(|c| c.to_string()).unwrap_or_else(|| "an unknown amount".into());
                info!("🧮️ Refund processed for charge {}: {refunded}", event.object_id);
                Ok(ReconcileOutcome::RefundNoted { charge_id: event.object_id.clone() })
            },
            GatewayEventKind::Other(event_type) => {
                debug!("🧮️ Unhandled event type: {event_type}");
                Ok(ReconcileOutcome::Ignored(event_type.clone()))
            },
        }
    }

    fn intent_for<'a>(&self, event: &'a GatewayEvent) -> Result<&'a str, ReconcileError> {
        event.intent_id().filter(|id| !id.is_empty()).ok_or_else(|| ReconcileError::MissingIntentReference(event.id.clone()))
    }

    async fn fetch_order(&self, intent_id: &str) -> Result<Order, ReconcileError> {
        self.db
            .fetch_order_by_intent_id(intent_id)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(intent_id.to_string()))
    }

    async fn process_payment_success(&self, intent_id: &str) -> Result<ReconcileOutcome, ReconcileError> {
        let _guard = self.locks.lock(&intent_id.to_string()).await;
        let mut order = self.fetch_order(intent_id).await?;
        match order.status {
            OrderStatusType::Completed => {
                info!("🧮️ Order {} is already completed. Ignoring repeated success notice.", order.id);
                return Ok(ReconcileOutcome::AlreadyApplied(order));
            },
            OrderStatusType::Pending => {
                order = self.db.update_order_status(&order.id, OrderStatusType::Processing, None).await?;
            },
            OrderStatusType::Processing => {},
            from @ (OrderStatusType::Failed | OrderStatusType::Refunded) => {
                error!("🧮️ Payment succeeded for order {}, but the order is {from}. Leaving it untouched.", order.id);
                return Err(OrderManagementError::InvalidTransition {
                    order_id: order.id,
                    from,
                    to: OrderStatusType::Completed,
                }
                .into());
            },
        }
        let order = self.db.update_order_status(&order.id, OrderStatusType::Completed, Some(Utc::now())).await?;
        info!("🧮️ Payment succeeded. Order {} is complete.", order.id);
        self.producers.publish_order_completed(OrderCompletedEvent::new(order.clone())).await;
        Ok(ReconcileOutcome::Completed(order))
    }

    async fn process_payment_failure(&self, intent_id: &str, reason: &str) -> Result<ReconcileOutcome, ReconcileError> {
        let _guard = self.locks.lock(&intent_id.to_string()).await;
        let order = self.fetch_order(intent_id).await?;
        match order.status {
            OrderStatusType::Failed => {
                info!("🧮️ Order {} has already failed. Ignoring repeated notice.", order.id);
                Ok(ReconcileOutcome::AlreadyApplied(order))
            },
            OrderStatusType::Pending | OrderStatusType::Processing => {
                let order = self.db.update_order_status(&order.id, OrderStatusType::Failed, None).await?;
                info!("🧮️ Order {} failed: {reason}", order.id);
                self.producers.publish_order_failed(OrderFailedEvent::new(order.clone(), reason)).await;
                Ok(ReconcileOutcome::Failed(order))
            },
            from @ (OrderStatusType::Completed | OrderStatusType::Refunded) => {
                error!("🧮️ Received '{reason}' for order {}, but the order is {from}. Leaving it untouched.", order.id);
                Err(OrderManagementError::InvalidTransition { order_id: order.id, from, to: OrderStatusType::Failed }
                    .into())
            },
        }
    }
}

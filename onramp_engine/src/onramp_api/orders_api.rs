//! Read access to the order ledger, plus manual status changes.

use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderCompletedEvent, OrderFailedEvent},
    traits::{OrderManagement, OrderManagementError},
};

pub struct OrdersApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi ({:?})", self.db)
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Fetches the order with the given id. If no order exists, `None` is returned.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        self.db.fetch_order_by_id(order_id).await
    }

    /// All orders placed with the given email address. Matching is exact.
    pub async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderManagementError> {
        self.db.fetch_orders_for_email(email).await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        self.db.fetch_all_orders().await
    }

    /// Applies a status change directly. Moving to `completed` stamps the completion time. Only transitions allowed
    /// by the order state machine are accepted.
    pub async fn update_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, OrderManagementError> {
        let completed_at = (status == OrderStatusType::Completed).then(Utc::now);
        let order = self.db.update_order_status(order_id, status, completed_at).await?;
        info!("📦️ Order {order_id} manually set to {status}");
        match status {
            OrderStatusType::Completed => {
                self.producers.publish_order_completed(OrderCompletedEvent::new(order.clone())).await
            },
            OrderStatusType::Failed => {
                self.producers.publish_order_failed(OrderFailedEvent::new(order.clone(), "manual")).await
            },
            _ => {},
        }
        Ok(order)
    }
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        db_types::{CryptoAsset, NewOrder},
        events::EventProducer,
        InMemoryDatabase,
    };

    async fn seeded_db() -> (InMemoryDatabase, OrderId) {
        let db = InMemoryDatabase::new();
        let order = db
            .insert_order(NewOrder {
                id: OrderId::from("order-7".to_string()),
                symbol: CryptoAsset::Sol,
                crypto_amount: dec!(0.5),
                fiat_amount: dec!(100),
                price_at_purchase: dec!(200),
                platform_fee: dec!(2.5),
                total_charged: dec!(102.5),
                customer_email: "frank@example.com".into(),
                wallet_address: "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV".into(),
                payment_method: None,
                payment_intent_id: "pi_sol".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        (db, order.id)
    }

    #[tokio::test]
    async fn status_changes_follow_the_state_machine_and_publish_events() {
        let (db, id) = seeded_db().await;
        let (completed_tx, mut completed_rx) = mpsc::channel(4);
        let (failed_tx, mut failed_rx) = mpsc::channel(4);
        let mut producers = EventProducers::default();
        producers.order_completed_producer.push(EventProducer::new(completed_tx));
        producers.order_failed_producer.push(EventProducer::new(failed_tx));
        let api = OrdersApi::new(db, producers);

        let err = api.update_status(&id, OrderStatusType::Completed).await.unwrap_err();
        assert!(matches!(err, OrderManagementError::InvalidTransition { .. }));
        assert!(completed_rx.try_recv().is_err());

        let order = api.update_status(&id, OrderStatusType::Processing).await.unwrap();
        assert_eq!(order.status, OrderStatusType::Processing);
        assert!(order.completed_at.is_none());
        assert!(completed_rx.try_recv().is_err());

        let order = api.update_status(&id, OrderStatusType::Completed).await.unwrap();
        assert!(order.completed_at.is_some());
        let event = completed_rx.try_recv().unwrap();
        assert_eq!(event.order, order);

        let err = api.update_status(&id, OrderStatusType::Failed).await.unwrap_err();
        assert!(matches!(err, OrderManagementError::InvalidTransition { .. }));
        assert!(failed_rx.try_recv().is_err());
        assert_eq!(api.fetch_order(&id).await.unwrap().unwrap(), order);
    }

    #[tokio::test]
    async fn unknown_orders_cannot_change_status() {
        let api = OrdersApi::new(InMemoryDatabase::new(), EventProducers::default());
        let id = OrderId::from("missing".to_string());
        let err = api.update_status(&id, OrderStatusType::Failed).await.unwrap_err();
        assert_eq!(err, OrderManagementError::OrderNotFound(id));
    }
}

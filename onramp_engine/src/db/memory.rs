use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderManagement, OrderManagementError},
};

#[derive(Debug, Default)]
struct OrderTables {
    orders: HashMap<OrderId, Order>,
    by_intent: HashMap<String, OrderId>,
}

/// A process-local order ledger. Both indexes live behind the same lock, so every insert and status change is
/// applied as one step. Contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    fn transition(order: &mut Order, to: OrderStatusType) -> Result<(), OrderManagementError> {
        if !order.status.can_transition_to(to) {
            return Err(OrderManagementError::InvalidTransition { order_id: order.id.clone(), from: order.status, to });
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(())
    }
}

impl OrderManagement for InMemoryDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(OrderManagementError::OrderAlreadyExists(order.id));
        }
        if tables.by_intent.contains_key(&order.payment_intent_id) {
            return Err(OrderManagementError::IntentAlreadyLinked(order.payment_intent_id));
        }
        let order = Order::from(order);
        tables.by_intent.insert(order.payment_intent_id.clone(), order.id.clone());
        tables.orders.insert(order.id.clone(), order.clone());
        trace!("🗃️ Order {} stored against payment intent {}", order.id, order.payment_intent_id);
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        Ok(self.tables.read().await.orders.get(id).cloned())
    }

    async fn fetch_order_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, OrderManagementError> {
        let tables = self.tables.read().await;
        Ok(tables.by_intent.get(intent_id).and_then(|id| tables.orders.get(id)).cloned())
    }

    async fn fetch_orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderManagementError> {
        let tables = self.tables.read().await;
        let mut orders = tables.orders.values().filter(|o| o.customer_email == email).cloned().collect::<Vec<_>>();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        let tables = self.tables.read().await;
        let mut orders = tables.orders.values().cloned().collect::<Vec<_>>();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatusType,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Order, OrderManagementError> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(id).ok_or_else(|| OrderManagementError::OrderNotFound(id.clone()))?;
        let from = order.status;
        Self::transition(order, status)?;
        if order.completed_at.is_none() {
            order.completed_at = completed_at;
        }
        debug!("🗃️ Order {id} moved from {from} to {status}");
        Ok(order.clone())
    }

    async fn record_refund(&self, id: &OrderId, amount: Decimal) -> Result<Order, OrderManagementError> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(id).ok_or_else(|| OrderManagementError::OrderNotFound(id.clone()))?;
        Self::transition(order, OrderStatusType::Refunded)?;
        order.amount_refunded = Some(amount);
        debug!("🗃️ Order {id} refunded ${amount}");
        Ok(order.clone())
    }
}

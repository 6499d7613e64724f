use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Payment intent {0} is already linked to another order")]
    IntentAlreadyLinked(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

/// The order ledger.
///
/// Every method is a single atomic step. In particular, reads never observe a half-applied update, and the
/// payment-intent index always agrees with the primary store.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Stores a new order with status `pending`. Fails if the id or the payment intent is already known.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;

    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_order_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderManagementError>;

    /// All orders, oldest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderManagementError>;

    /// Moves the order to `status` if the state machine allows it, refreshing `updated_at`. `completed_at` is only
    /// recorded the first time it is supplied.
    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatusType,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Order, OrderManagementError>;

    /// Marks the order as refunded and records the refunded amount in the same step.
    async fn record_refund(&self, id: &OrderId, amount: Decimal) -> Result<Order, OrderManagementError>;
}

use log::*;
use onramp_engine::events::{
    EventHandlers,
    EventHooks,
    OrderCompletedEvent,
    OrderCreatedEvent,
    OrderFailedEvent,
    OrderRefundedEvent,
};

pub const AUDIT_EVENT_BUFFER_SIZE: usize = 25;

/// Event handlers that write an audit trail of every order state change to the log.
///
/// Settlement on-chain is out of scope for this server; a dispatcher would subscribe to completions in the same way.
pub fn create_audit_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|OrderCreatedEvent { order }| {
            Box::pin(async move {
                info!(
                    "📬️ Order {} created: {} {} for ${} (intent {})",
                    order.id, order.crypto_amount, order.symbol, order.total_charged, order.payment_intent_id
                );
            })
        })
        .on_order_completed(|OrderCompletedEvent { order }| {
            Box::pin(async move {
                info!(
                    "📬️ Order {} completed. {} {} is due to {}",
                    order.id, order.crypto_amount, order.symbol, order.wallet_address
                );
            })
        })
        .on_order_failed(|OrderFailedEvent { order, reason }| {
            Box::pin(async move {
                info!("📬️ Order {} failed. {reason}", order.id);
            })
        })
        .on_order_refunded(|OrderRefundedEvent { order, refund }| {
            Box::pin(async move {
                info!("📬️ Order {} refunded. {} returned in refund {}", order.id, refund.amount, refund.id);
            })
        });
    EventHandlers::new(AUDIT_EVENT_BUFFER_SIZE, hooks)
}

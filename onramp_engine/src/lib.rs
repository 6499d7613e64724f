//! Onramp Engine
//!
//! The onramp engine holds the core logic for selling crypto assets to customers who pay in fiat. It is
//! provider-agnostic: price data and card payments are reached through the [`PriceFeed`] and [`PaymentGateway`]
//! traits, and orders are kept by any backend that implements [`OrderManagement`].
//!
//! The library is divided into three main sections:
//! 1. The order ledger ([`mod@db`]). An in-memory backend is provided. The ledger enforces the order state machine
//!    and keeps the payment-intent index consistent with the primary store.
//! 2. The public API ([`mod@onramp_api`]). This covers price lookups with caching, quote calculation, order
//!    creation, refunds and the reconciliation of asynchronous payment notifications.
//! 3. Events ([`mod@events`]). Hooks can be attached to order creation, completion, failure and refunds.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod onramp_api;
pub mod traits;

pub use db::memory::InMemoryDatabase;
pub use onramp_api::{
    asset_objects,
    errors::{OrderFlowError, PriceOracleError, QuoteError, ReconcileError},
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrdersApi,
    payment_objects,
    price_objects,
    price_oracle_api::{PriceOracleApi, DEFAULT_PRICE_CACHE_TTL},
    quote_api::{calculate_quote, QuoteApi, QUOTE_VALIDITY},
    reconciler_api::{ReconcileOutcome, ReconcilerApi},
};
pub use traits::{OrderManagement, PaymentGateway, PriceFeed};

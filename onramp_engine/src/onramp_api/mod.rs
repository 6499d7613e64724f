//! # Onramp engine public API
//!
//! The API is modular. Each piece is created by supplying the backends that implement the traits it needs.
//!
//! * [`price_oracle_api`] caches upstream prices per asset and collapses concurrent lookups into a single fetch.
//! * [`quote_api`] turns a USD amount into a priced, fee-inclusive quote.
//! * [`order_flow_api`] creates orders backed by a payment intent and issues administrative refunds.
//! * [`orders_api`] answers read queries against the ledger and applies manual status updates.
//! * [`reconciler_api`] applies authenticated payment notifications to orders, idempotently.
//!
//! ```rust,ignore
//! use onramp_engine::{asset_objects::AssetCatalog, price_objects::FeeSchedule, PriceOracleApi, QuoteApi};
//! let oracle = Arc::new(PriceOracleApi::new(feed, AssetCatalog::default(), Duration::from_secs(60)));
//! let quotes = QuoteApi::new(oracle, FeeSchedule::default());
//! let quote = quotes.quote("BTC", dec!(100), Utc::now()).await?;
//! ```
pub mod asset_objects;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
pub mod payment_objects;
pub mod price_objects;
pub mod price_oracle_api;
pub mod quote_api;
pub mod reconciler_api;

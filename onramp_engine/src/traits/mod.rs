//! # Backend contracts
//!
//! The engine never talks to a price provider, a card processor or a storage engine directly. Instead, it relies on
//! these traits, so that backends can be swapped (or mocked in tests) freely.
//!
//! * [`PriceFeed`] fetches the current USD price for a single [`CryptoAsset`](crate::db_types::CryptoAsset).
//! * [`PaymentGateway`] opens payment intents, issues refunds and authenticates inbound notifications.
//! * [`OrderManagement`] is the order ledger. Implementations must apply every status change atomically and reject
//!   transitions that the order state machine does not allow.
mod order_management;
mod payment_gateway;
mod price_feed;

pub use order_management::{OrderManagement, OrderManagementError};
pub use payment_gateway::{GatewayError, PaymentGateway};
pub use price_feed::{PriceFeed, PriceFeedError};

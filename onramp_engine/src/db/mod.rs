//! Order ledger backends.
//!
//! Only an in-memory backend ships with the engine. Any other storage can be plugged in by implementing
//! [`OrderManagement`](crate::traits::OrderManagement).
pub mod memory;

//! Adapters that bind third-party services to the engine's backend traits, plus the server's own event hooks.
pub mod audit;
pub mod coingecko;
pub mod stripe;

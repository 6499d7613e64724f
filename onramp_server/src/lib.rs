//! # Onramp server
//! This crate hosts the HTTP API for the fiat-to-crypto onramp. It is responsible for:
//! * Serving prices and quotes for the supported crypto assets.
//! * Creating orders, each backed by a card payment intent.
//! * Receiving payment processor webhooks and handing them to the order reconciler.
//! * Admin-only order queries and refunds, gated by a shared API key.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route.
//! * `/api/crypto/...`: Prices and the supported asset list.
//! * `/api/orders/...`: Quotes, order creation and lookup, and (admin) refunds.
//! * `/api/payments/config`: The publishable key clients need to collect card details.
//! * `/api/webhooks/stripe`: Payment processor notifications.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;

//! A thin client for the parts of the Stripe API the onramp needs: payment intents, refunds and webhook
//! signature verification.
mod api;
mod config;
mod data_objects;
mod error;
pub mod webhook;

pub use api::StripeApi;
pub use config::{StripeConfig, DEFAULT_STRIPE_API_URL, DEFAULT_WEBHOOK_TOLERANCE_SECS};
pub use data_objects::{EventData, StripeCharge, StripeEvent, StripePaymentIntent, StripeRefund};
pub use error::StripeApiError;

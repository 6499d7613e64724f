use chrono::{DateTime, Utc};
use log::*;
use onramp_common::{Cents, Secret};
use onramp_engine::{
    payment_objects::{GatewayEvent, GatewayEventKind, IntentMetadata, PaymentIntent, RefundReason, RefundRecord},
    traits::{GatewayError, PaymentGateway},
};
use rust_decimal::Decimal;
use stripe_tools::{StripeApi, StripeApiError, StripeConfig, StripeEvent, StripePaymentIntent};

/// A [`PaymentGateway`] backed by the Stripe REST API.
#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }

    pub fn publishable_key(&self) -> &str {
        self.api.config().publishable_key.as_str()
    }
}

fn to_gateway_error(e: StripeApiError) -> GatewayError {
    match e {
        StripeApiError::Timeout(s) => GatewayError::Timeout(s),
        StripeApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        StripeApiError::InvalidCurrencyAmount(s) => GatewayError::InvalidAmount(s),
        StripeApiError::InvalidSignature(s) => GatewayError::InvalidSignature(s),
        StripeApiError::JsonError(s) => GatewayError::MalformedPayload(s),
        StripeApiError::Initialization(s) | StripeApiError::RestResponseError(s) => GatewayError::RequestFailed(s),
    }
}

fn to_cents(amount_usd: Decimal) -> Result<Cents, GatewayError> {
    Cents::from_usd(amount_usd).map_err(|e| GatewayError::InvalidAmount(e.to_string()))
}

fn to_payment_intent(intent: StripePaymentIntent) -> Result<PaymentIntent, GatewayError> {
    let client_secret = intent.client_secret.ok_or_else(|| {
        GatewayError::MalformedPayload(format!("Payment intent {} was returned without a client secret", intent.id))
    })?;
    Ok(PaymentIntent {
        id: intent.id,
        client_secret: Secret::new(client_secret),
        amount: Cents::from(intent.amount),
        currency: intent.currency.to_uppercase(),
        status: intent.status,
    })
}

/// Translates a verified Stripe event into the engine's processor-neutral form.
pub fn to_gateway_event(event: StripeEvent) -> Result<GatewayEvent, GatewayError> {
    let object_id = event
        .object_id()
        .ok_or_else(|| GatewayError::MalformedPayload(format!("Event {} has no object id", event.id)))?
        .to_string();
    let kind = match event.event_type.as_str() {
        "payment_intent.succeeded" => GatewayEventKind::PaymentSucceeded,
        "payment_intent.payment_failed" => GatewayEventKind::PaymentFailed,
        "payment_intent.canceled" => GatewayEventKind::PaymentCanceled,
        "charge.refunded" => GatewayEventKind::ChargeRefunded,
        other => GatewayEventKind::Other(other.to_string()),
    };
    let (payment_intent_id, amount_refunded) = match kind {
        GatewayEventKind::ChargeRefunded => {
            let charge = event.charge();
            (
                charge.as_ref().and_then(|c| c.payment_intent.clone()),
                charge.map(|c| Cents::from(c.amount_refunded)),
            )
        },
        _ => (None, None),
    };
    let created_at = DateTime::<Utc>::from_timestamp(event.created, 0).unwrap_or_else(Utc::now);
    Ok(GatewayEvent { id: event.id, kind, object_id, payment_intent_id, amount_refunded, created_at })
}

impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_usd: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError> {
        let amount = to_cents(amount_usd)?;
        let intent = self
            .api
            .create_payment_intent(amount, currency, &metadata.to_pairs())
            .await
            .map_err(to_gateway_error)?;
        to_payment_intent(intent)
    }

    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let intent = self.api.get_payment_intent(intent_id).await.map_err(to_gateway_error)?;
        to_payment_intent(intent)
    }

    async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let intent = self.api.confirm_payment_intent(intent_id).await.map_err(to_gateway_error)?;
        to_payment_intent(intent)
    }

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_usd: Option<Decimal>,
        reason: Option<RefundReason>,
    ) -> Result<RefundRecord, GatewayError> {
        let amount = amount_usd.map(to_cents).transpose()?;
        let refund = self
            .api
            .create_refund(intent_id, amount, reason.as_ref().map(RefundReason::as_str))
            .await
            .map_err(to_gateway_error)?;
        Ok(RefundRecord {
            id: refund.id,
            payment_intent_id: refund.payment_intent.unwrap_or_else(|| intent_id.to_string()),
            amount: Cents::from(refund.amount),
            status: refund.status.unwrap_or_else(|| "pending".to_string()),
            reason,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        let now = Utc::now().timestamp();
        let event = self.api.construct_event(payload, signature, now).map_err(|e| {
            warn!("💳️ Webhook rejected. {e}");
            to_gateway_error(e)
        })?;
        debug!("💳️ Verified Stripe event {} ({})", event.id, event.event_type);
        to_gateway_event(event)
    }
}

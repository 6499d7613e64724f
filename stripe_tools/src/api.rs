use std::sync::Arc;

use log::*;
use onramp_common::Cents;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::StripeConfig, webhook, StripeApiError, StripeEvent, StripePaymentIntent, StripeRefund};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Sends a form-encoded request, which is what the Stripe REST API expects for writes.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub async fn create_payment_intent(
        &self,
        amount: Cents,
        currency: &str,
        metadata: &[(String, String)],
    ) -> Result<StripePaymentIntent, StripeApiError> {
        if amount.value() <= 0 {
            return Err(StripeApiError::InvalidCurrencyAmount(format!("{amount} is not a chargeable amount")));
        }
        let mut form = vec![
            ("amount".to_string(), amount.value().to_string()),
            ("currency".to_string(), currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        form.extend(metadata.iter().map(|(k, v)| (format!("metadata[{k}]"), v.clone())));
        debug!("Creating payment intent for {amount}");
        let intent = self.rest_query::<StripePaymentIntent>(Method::POST, "/payment_intents", &form).await?;
        info!("Created payment intent {} for {amount}", intent.id);
        Ok(intent)
    }

    pub async fn get_payment_intent(&self, intent_id: &str) -> Result<StripePaymentIntent, StripeApiError> {
        let path = format!("/payment_intents/{intent_id}");
        self.rest_query::<StripePaymentIntent>(Method::GET, &path, &[]).await
    }

    pub async fn confirm_payment_intent(&self, intent_id: &str) -> Result<StripePaymentIntent, StripeApiError> {
        let path = format!("/payment_intents/{intent_id}/confirm");
        debug!("Confirming payment intent {intent_id}");
        self.rest_query::<StripePaymentIntent>(Method::POST, &path, &[]).await
    }

    /// Refunds the charge behind a payment intent. Omitting `amount` refunds it in full.
    pub async fn create_refund(
        &self,
        intent_id: &str,
        amount: Option<Cents>,
        reason: Option<&str>,
    ) -> Result<StripeRefund, StripeApiError> {
        let mut form = vec![("payment_intent".to_string(), intent_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount".to_string(), amount.value().to_string()));
        }
        if let Some(reason) = reason {
            form.push(("reason".to_string(), reason.to_string()));
        }
        debug!("Refunding payment intent {intent_id}");
        let refund = self.rest_query::<StripeRefund>(Method::POST, "/refunds", &form).await?;
        info!("Created refund {} of {} for payment intent {intent_id}", refund.id, Cents::from(refund.amount));
        Ok(refund)
    }

    /// Verifies a webhook delivery against the configured signing secret and decodes it.
    pub fn construct_event(&self, payload: &[u8], signature: &str, now: i64) -> Result<StripeEvent, StripeApiError> {
        webhook::construct_event(
            payload,
            signature,
            self.config.webhook_secret.reveal(),
            self.config.webhook_tolerance_secs,
            now,
        )
    }
}

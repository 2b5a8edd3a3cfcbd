use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::config::StripeConfig;

/// Handle to an external payment intent.
#[derive(Debug, Clone)]
pub struct IntentHandle {
    pub id: String,
    pub amount: f64,
    pub currency: String,
}

/// Processor-reported state of an intent. Only `Succeeded` ever advances
/// local state; anything ambiguous stays `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStatus {
    Succeeded,
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
pub struct IntentMetadata {
    pub quote_id: String,
    pub payer_email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Payment processor unreachable: {0}")]
    Unreachable(String),

    #[error("Payment processor rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected processor response: {0}")]
    InvalidResponse(String),
}

/// Boundary contract with the payment processor. The processor is the
/// only source of truth for "was the customer actually charged".
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(
        &self,
        amount: f64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<IntentHandle, ProcessorError>;

    /// Report the current status and amount of an existing intent.
    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<(IntentStatus, f64), ProcessorError>;
}

/// Stripe expects integer cents; amounts are stored in their natural
/// decimal form and converted at this boundary.
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn map_intent_status(status: &str) -> IntentStatus {
    match status {
        "succeeded" => IntentStatus::Succeeded,
        "canceled" => IntentStatus::Failed,
        _ => IntentStatus::Pending,
    }
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Thin Stripe REST client (form-encoded, bearer auth).
#[derive(Debug, Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        StripeGateway {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn parse_intent(
        &self,
        response: reqwest::Response,
    ) -> Result<StripeIntent, ProcessorError> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<StripeIntent>()
                .await
                .map_err(|e| ProcessorError::InvalidResponse(e.to_string()))
        } else {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            error!("Stripe rejected the request: {}", message);
            Err(ProcessorError::Rejected(message))
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    #[instrument(skip(self, metadata), fields(amount = amount, currency = %currency))]
    async fn create_intent(
        &self,
        amount: f64,
        currency: &str,
        metadata: &IntentMetadata,
    ) -> Result<IntentHandle, ProcessorError> {
        info!("Creating payment intent");
        let url = format!("{}/v1/payment_intents", self.config.api_base);
        let cents = amount_to_cents(amount).to_string();
        let params = [
            ("amount", cents.as_str()),
            ("currency", currency),
            ("metadata[quote_id]", metadata.quote_id.as_str()),
            ("metadata[payer_email]", metadata.payer_email.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach payment processor: {}", e);
                ProcessorError::Unreachable(e.to_string())
            })?;

        let intent = self.parse_intent(response).await?;
        info!(intent_id = %intent.id, "Payment intent created");
        Ok(IntentHandle {
            id: intent.id,
            amount: cents_to_amount(intent.amount),
            currency: intent.currency,
        })
    }

    #[instrument(skip(self), fields(intent_id = %intent_id))]
    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<(IntentStatus, f64), ProcessorError> {
        let url = format!(
            "{}/v1/payment_intents/{}",
            self.config.api_base, intent_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach payment processor: {}", e);
                ProcessorError::Unreachable(e.to_string())
            })?;

        let intent = self.parse_intent(response).await?;
        Ok((
            map_intent_status(&intent.status),
            cents_to_amount(intent.amount),
        ))
    }
}

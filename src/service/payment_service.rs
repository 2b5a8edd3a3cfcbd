use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::dto::payment_dto::PaymentIntentResponse;
use crate::model::actor::Actor;
use crate::model::payment::Payment;
use crate::model::quote::Quote;
use crate::repository::payment_repo::PaymentRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::repository::repository_error::RepositoryError;
use crate::util::error::ServiceError;
use crate::util::stripe::{
    amount_to_cents, IntentMetadata, IntentStatus, PaymentProcessor, ProcessorError,
};

/// Per-quote payment-intent lifecycle: `no intent → intent created →
/// confirmed`, mapped onto `final_payment: pending → pending → paid`.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Create (or reuse) the external payment intent for an approved,
    /// priced quote. Idempotent per quote until confirmed: an existing
    /// intent for the current price is returned as-is; a price change
    /// supersedes it with a fresh intent.
    async fn create_intent(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<PaymentIntentResponse, ServiceError>;

    /// Record a processor-confirmed payment. Idempotent: confirming an
    /// already-paid quote returns the existing Payment without creating a
    /// duplicate or re-charging.
    async fn confirm_payment(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
        intent_id: &str,
    ) -> Result<Payment, ServiceError>;

    async fn list_payments(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<Vec<Payment>, ServiceError>;
}

pub struct PaymentServiceImpl {
    quote_repo: Arc<dyn QuoteRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
}

impl PaymentServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        processor: Arc<dyn PaymentProcessor>,
        currency: String,
    ) -> Self {
        PaymentServiceImpl {
            quote_repo,
            payment_repo,
            processor,
            currency,
        }
    }

    fn amounts_equal(a: f64, b: f64) -> bool {
        amount_to_cents(a) == amount_to_cents(b)
    }

    fn check_payable(quote: &Quote) -> Result<f64, ServiceError> {
        if !quote.is_approved() {
            return Err(ServiceError::IllegalState(
                "payment requires an approved quote".to_string(),
            ));
        }
        let price = quote.estimated_price.ok_or_else(|| {
            ServiceError::IllegalState("quote has no estimated price".to_string())
        })?;
        if quote.pipeline.final_payment.is_complete() {
            return Err(ServiceError::IllegalState(
                "final payment already collected for this quote".to_string(),
            ));
        }
        Ok(price)
    }

    /// The idempotent-success path: the quote is already paid, so return
    /// the succeeded Payment instead of charging again.
    async fn existing_payment(&self, quote_id: ObjectId) -> Result<Payment, ServiceError> {
        match self
            .payment_repo
            .find_succeeded_by_quote(quote_id)
            .await
            .map_err(ServiceError::from)?
        {
            Some(payment) => Ok(payment),
            None => Err(ServiceError::InternalError(
                "quote is marked paid but no succeeded payment record exists".to_string(),
            )),
        }
    }
}

impl From<ProcessorError> for ServiceError {
    fn from(err: ProcessorError) -> Self {
        ServiceError::External(err.to_string())
    }
}

#[async_trait]
impl PaymentService for PaymentServiceImpl {
    #[instrument(skip(self, actor), fields(quote_id = %quote_id))]
    async fn create_intent(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<PaymentIntentResponse, ServiceError> {
        let quote = self
            .quote_repo
            .get_by_id(quote_id)
            .await
            .map_err(ServiceError::from)?;
        actor.require_quote_access(&quote)?;

        let price = Self::check_payable(&quote)?;

        // Reuse the live intent while the price is unchanged; a stale
        // intent (price changed since creation) is superseded instead of
        // double-charging.
        if let (Some(intent_id), Some(intent_amount)) =
            (&quote.payment_intent_id, quote.payment_intent_amount)
        {
            if Self::amounts_equal(intent_amount, price) {
                info!(intent_id = %intent_id, "Reusing existing payment intent");
                return Ok(PaymentIntentResponse {
                    intent_id: intent_id.clone(),
                    amount: price,
                    currency: self.currency.clone(),
                });
            }
            warn!(
                intent_id = %intent_id,
                "Recorded intent amount is stale, creating a new intent"
            );
        }

        let metadata = IntentMetadata {
            quote_id: quote_id.to_hex(),
            payer_email: quote.email.clone(),
        };
        let handle = self
            .processor
            .create_intent(price, &self.currency, &metadata)
            .await?;

        self.quote_repo
            .record_payment_intent(quote_id, &handle.id, price)
            .await
            .map_err(ServiceError::from)?;
        self.payment_repo
            .create_pending(quote_id, &handle.id, price)
            .await
            .map_err(ServiceError::from)?;

        info!(intent_id = %handle.id, "Payment intent created");
        Ok(PaymentIntentResponse {
            intent_id: handle.id,
            amount: price,
            currency: self.currency.clone(),
        })
    }

    #[instrument(skip(self, actor), fields(quote_id = %quote_id, intent_id = %intent_id))]
    async fn confirm_payment(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
        intent_id: &str,
    ) -> Result<Payment, ServiceError> {
        let quote = self
            .quote_repo
            .get_by_id(quote_id)
            .await
            .map_err(ServiceError::from)?;
        actor.require_quote_access(&quote)?;

        if quote.pipeline.final_payment.is_complete() {
            info!("Quote already paid, returning existing payment");
            return self.existing_payment(quote_id).await;
        }

        if !quote.is_approved() {
            return Err(ServiceError::IllegalState(
                "payment requires an approved quote".to_string(),
            ));
        }
        let price = quote.estimated_price.ok_or_else(|| {
            ServiceError::IllegalState("quote has no estimated price".to_string())
        })?;

        // The processor is the only source of truth for "the customer was
        // actually charged"; only an explicit success advances state.
        let (status, intent_amount) = self.processor.retrieve_intent(intent_id).await?;
        match status {
            IntentStatus::Succeeded => {}
            IntentStatus::Pending => {
                return Err(ServiceError::IllegalState(
                    "payment has not completed at the processor".to_string(),
                ));
            }
            IntentStatus::Failed => {
                return Err(ServiceError::IllegalState(
                    "payment failed at the processor; create a new intent to retry".to_string(),
                ));
            }
        }

        // A stale intent (price changed after creation) must not settle
        // the quote at the wrong amount.
        if !Self::amounts_equal(intent_amount, price) {
            return Err(ServiceError::InvalidInput(format!(
                "intent amount {} does not match the current estimated price {}",
                intent_amount, price
            )));
        }

        match self
            .quote_repo
            .mark_final_payment_paid(quote_id, price)
            .await
        {
            Ok(_) => {}
            Err(RepositoryError::AlreadyExists(_)) => {
                // A concurrent confirmation won the conditional write. Its
                // Payment record may not be finalized yet, so a missing
                // record here is a race window, not an invariant breach.
                return match self
                    .payment_repo
                    .find_succeeded_by_quote(quote_id)
                    .await
                    .map_err(ServiceError::from)?
                {
                    Some(payment) => Ok(payment),
                    None => Err(ServiceError::Conflict(
                        "payment confirmed concurrently; re-read and retry".to_string(),
                    )),
                };
            }
            Err(e) => {
                error!("Failed to mark final payment paid: {e}");
                return Err(ServiceError::from(e));
            }
        }

        let payment = match self
            .payment_repo
            .finalize_succeeded(intent_id)
            .await
            .map_err(ServiceError::from)?
        {
            Some(payment) => payment,
            None => {
                // No pending record (intent created out-of-band); insert
                // the succeeded record directly so the paid invariant holds.
                let now = chrono::Utc::now().to_rfc3339();
                self.payment_repo
                    .insert_succeeded(Payment {
                        id: None,
                        quote_id,
                        intent_id: intent_id.to_string(),
                        amount: price,
                        status: crate::model::payment::PaymentStatus::Succeeded,
                        created_at: now.clone(),
                        confirmed_at: Some(now),
                    })
                    .await
                    .map_err(ServiceError::from)?
            }
        };

        info!("Payment confirmed and recorded");
        Ok(payment)
    }

    #[instrument(skip(self, actor), fields(quote_id = %quote_id))]
    async fn list_payments(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<Vec<Payment>, ServiceError> {
        actor.require_staff()?;
        self.payment_repo
            .list_by_quote(quote_id)
            .await
            .map_err(ServiceError::from)
    }
}

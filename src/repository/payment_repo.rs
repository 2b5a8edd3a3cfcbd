use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::payment::{Payment, PaymentStatus};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Upsert the pending payment record for a quote. A new intent for the
    /// same quote supersedes any prior pending record instead of stacking
    /// duplicates.
    async fn create_pending(
        &self,
        quote_id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Payment>;

    /// Conditionally move a pending record to succeeded. Returns `None`
    /// when no pending record exists for the intent (already finalized,
    /// or confirmed out-of-band).
    async fn finalize_succeeded(&self, intent_id: &str) -> RepositoryResult<Option<Payment>>;

    /// Insert an already-succeeded record directly; fallback used when a
    /// confirmation arrives without a pending record.
    async fn insert_succeeded(&self, payment: Payment) -> RepositoryResult<Payment>;

    async fn find_succeeded_by_quote(&self, quote_id: ObjectId)
        -> RepositoryResult<Option<Payment>>;

    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<Payment>>;
}

pub struct MongoPaymentRepository {
    collection: mongodb::Collection<Payment>,
}

impl MongoPaymentRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = super::connect(config).await?;
        Ok(MongoPaymentRepository {
            collection: db.collection::<Payment>("payments"),
        })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl PaymentRepository for MongoPaymentRepository {
    #[tracing::instrument(skip(self), fields(quote_id = %quote_id, intent_id = %intent_id))]
    async fn create_pending(
        &self,
        quote_id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Payment> {
        // Replace whatever pending record the quote had; only one intent
        // is live per quote at a time.
        self.collection
            .delete_many(
                doc! { "quote_id": quote_id, "status": "pending" },
                None,
            )
            .await
            .map_err(RepositoryError::from)?;

        let payment = Payment {
            id: Some(ObjectId::new()),
            quote_id,
            intent_id: intent_id.to_string(),
            amount,
            status: PaymentStatus::Pending,
            created_at: Self::now(),
            confirmed_at: None,
        };
        match self.collection.insert_one(payment.clone(), None).await {
            Ok(_) => {
                info!("Pending payment recorded");
                Ok(payment)
            }
            Err(e) => {
                error!("Failed to record pending payment: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(intent_id = %intent_id))]
    async fn finalize_succeeded(&self, intent_id: &str) -> RepositoryResult<Option<Payment>> {
        let filter = doc! { "intent_id": intent_id, "status": "pending" };
        let update = doc! { "$set": {
            "status": "succeeded",
            "confirmed_at": Self::now(),
        }};
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        match self
            .collection
            .find_one_and_update(filter, update, options)
            .await
        {
            Ok(payment) => {
                if payment.is_some() {
                    info!("Payment finalized");
                }
                Ok(payment)
            }
            Err(e) => {
                error!("Failed to finalize payment: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self, payment))]
    async fn insert_succeeded(&self, payment: Payment) -> RepositoryResult<Payment> {
        let mut new_payment = payment;
        new_payment.id = Some(ObjectId::new());
        new_payment.status = PaymentStatus::Succeeded;
        if new_payment.confirmed_at.is_none() {
            new_payment.confirmed_at = Some(Self::now());
        }
        self.collection
            .insert_one(new_payment.clone(), None)
            .await
            .map_err(RepositoryError::from)?;
        Ok(new_payment)
    }

    #[tracing::instrument(skip(self), fields(quote_id = %quote_id))]
    async fn find_succeeded_by_quote(
        &self,
        quote_id: ObjectId,
    ) -> RepositoryResult<Option<Payment>> {
        let filter = doc! { "quote_id": quote_id, "status": "succeeded" };
        self.collection
            .find_one(filter, None)
            .await
            .map_err(RepositoryError::from)
    }

    #[tracing::instrument(skip(self), fields(quote_id = %quote_id))]
    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<Payment>> {
        let filter = doc! { "quote_id": quote_id };
        let mut cursor = self
            .collection
            .find(filter, None)
            .await
            .map_err(RepositoryError::from)?;
        let mut payments = Vec::new();
        while let Some(payment) = cursor.next().await {
            payments.push(payment.map_err(RepositoryError::from)?);
        }
        Ok(payments)
    }
}

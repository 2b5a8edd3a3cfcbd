use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::pipeline::PipelineState;
use crate::model::quote::{Quote, QuoteStatus};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Persistence contract for quotes.
///
/// Every precondition-gated mutation (approve, record intent, mark paid,
/// link project, pipeline update) performs its check and its write as one
/// conditional update, so the quote record acts as the unit of mutual
/// exclusion. Losers of a race get `Conflict` or `AlreadyExists`, never a
/// silent second application.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote>;
    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>>;
    async fn count(&self) -> RepositoryResult<u64>;

    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote>;
    async fn set_estimated_price(&self, id: ObjectId, price: f64) -> RepositoryResult<Quote>;
    async fn set_contract(&self, id: ObjectId, contract_id: ObjectId) -> RepositoryResult<Quote>;
    async fn set_attachments(&self, id: ObjectId, attachments: Vec<String>)
        -> RepositoryResult<Quote>;

    /// Flip status to approved, conditional on a price being set.
    async fn approve(&self, id: ObjectId) -> RepositoryResult<Quote>;

    /// Optimistic replacement of the pipeline subdocument, conditional on
    /// the previously observed state.
    async fn update_pipeline(
        &self,
        id: ObjectId,
        expected: &PipelineState,
        updated: &PipelineState,
    ) -> RepositoryResult<Quote>;

    /// Record (or supersede) the processor intent handle, conditional on
    /// the final payment still being pending.
    async fn record_payment_intent(
        &self,
        id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Quote>;

    /// Mark the final payment paid, conditional on it being pending and on
    /// the estimated price still matching the confirmed amount.
    async fn mark_final_payment_paid(
        &self,
        id: ObjectId,
        expected_amount: f64,
    ) -> RepositoryResult<Quote>;

    /// Set `project_id`, conditional on no project being linked yet and
    /// the quote being approved. The atomic gate of project promotion.
    async fn link_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<Quote>;

    /// Best-effort rollback of `link_project` when the project insert
    /// fails afterwards.
    async fn unlink_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<()>;
}

pub struct MongoQuoteRepository {
    collection: mongodb::Collection<Quote>,
}

impl MongoQuoteRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = super::connect(config).await?;
        Ok(MongoQuoteRepository {
            collection: db.collection::<Quote>("quotes"),
        })
    }

    fn after_update() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl QuoteRepository for MongoQuoteRepository {
    #[tracing::instrument(skip(self, quote))]
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote> {
        let mut new_quote = quote;
        new_quote.id = Some(ObjectId::new());
        let time = Self::now();
        new_quote.created_at = Some(time.clone());
        new_quote.updated_at = Some(time);

        match self.collection.insert_one(new_quote.clone(), None).await {
            Ok(_) => {
                info!(quote_id = %new_quote.id.unwrap(), "Quote created");
                Ok(new_quote)
            }
            Err(e) => {
                error!("Failed to create quote: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote not found for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to fetch quote by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(page = page, limit = limit))]
    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let find_options = mongodb::options::FindOptions::builder()
            .skip(skip as u64)
            .limit(limit as i64)
            .sort(doc! { "created_at": -1 })
            .build();
        let mut cursor = self
            .collection
            .find(None, find_options)
            .await
            .map_err(RepositoryError::from)?;

        let mut quotes = Vec::new();
        while let Some(quote) = cursor.next().await {
            match quote {
                Ok(q) => quotes.push(q),
                Err(e) => {
                    error!("Failed to deserialize quote: {}", e);
                    return Err(RepositoryError::from(e));
                }
            }
        }
        info!("Fetched {} quotes", quotes.len());
        Ok(quotes)
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self) -> RepositoryResult<u64> {
        self.collection
            .count_documents(None, None)
            .await
            .map_err(RepositoryError::from)
    }

    #[tracing::instrument(skip(self), fields(id = %id, status = ?status))]
    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "status": status.as_str(),
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => {
                info!("Quote status updated");
                Ok(quote)
            }
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote not found for ID: {}",
                id
            ))),
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, price = price))]
    async fn set_estimated_price(&self, id: ObjectId, price: f64) -> RepositoryResult<Quote> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "estimated_price": price,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote not found for ID: {}",
                id
            ))),
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, contract_id = %contract_id))]
    async fn set_contract(&self, id: ObjectId, contract_id: ObjectId) -> RepositoryResult<Quote> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "contract_id": contract_id,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote not found for ID: {}",
                id
            ))),
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self, attachments), fields(id = %id))]
    async fn set_attachments(
        &self,
        id: ObjectId,
        attachments: Vec<String>,
    ) -> RepositoryResult<Quote> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "attachments": &attachments,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote not found for ID: {}",
                id
            ))),
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn approve(&self, id: ObjectId) -> RepositoryResult<Quote> {
        // Check-and-write in one conditional update: only a priced quote
        // can become approved.
        let filter = doc! {
            "_id": id,
            "estimated_price": { "$ne": null },
        };
        let update = doc! { "$set": {
            "status": QuoteStatus::Approved.as_str(),
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => {
                info!("Quote approved");
                Ok(quote)
            }
            Ok(None) => {
                // Distinguish "no such quote" from "no price set".
                let quote = self.get_by_id(id).await?;
                if quote.estimated_price.is_none() {
                    Err(RepositoryError::validation(
                        "cannot approve a quote without an estimated price",
                    ))
                } else {
                    Err(RepositoryError::conflict(
                        "quote changed while approving; re-read and retry",
                    ))
                }
            }
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self, expected, updated), fields(id = %id))]
    async fn update_pipeline(
        &self,
        id: ObjectId,
        expected: &PipelineState,
        updated: &PipelineState,
    ) -> RepositoryResult<Quote> {
        let expected_doc = bson::to_bson(expected)?;
        let updated_doc = bson::to_bson(updated)?;
        let filter = doc! { "_id": id, "pipeline": expected_doc };
        let update = doc! { "$set": {
            "pipeline": updated_doc,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => {
                info!("Pipeline stage updated");
                Ok(quote)
            }
            Ok(None) => {
                self.get_by_id(id).await?;
                Err(RepositoryError::conflict(
                    "pipeline changed concurrently; re-read and retry",
                ))
            }
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, intent_id = %intent_id))]
    async fn record_payment_intent(
        &self,
        id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Quote> {
        let filter = doc! {
            "_id": id,
            "pipeline.final_payment": "pending",
        };
        let update = doc! { "$set": {
            "payment_intent_id": intent_id,
            "payment_intent_amount": amount,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => {
                self.get_by_id(id).await?;
                Err(RepositoryError::already_exists(
                    "final payment already collected for this quote",
                ))
            }
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, expected_amount = expected_amount))]
    async fn mark_final_payment_paid(
        &self,
        id: ObjectId,
        expected_amount: f64,
    ) -> RepositoryResult<Quote> {
        let filter = doc! {
            "_id": id,
            "pipeline.final_payment": "pending",
            "estimated_price": expected_amount,
        };
        let update = doc! { "$set": {
            "pipeline.final_payment": "paid",
            "pipeline.final_payment_paid_at": Self::now(),
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => {
                info!("Final payment marked paid");
                Ok(quote)
            }
            Ok(None) => {
                let quote = self.get_by_id(id).await?;
                if quote.pipeline.final_payment.is_complete() {
                    Err(RepositoryError::already_exists(
                        "final payment already collected for this quote",
                    ))
                } else {
                    Err(RepositoryError::conflict(
                        "quote changed during payment confirmation; re-read and retry",
                    ))
                }
            }
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, project_id = %project_id))]
    async fn link_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<Quote> {
        // The conditional on `project_id == null` is what makes promotion
        // exactly-once under concurrent invocation.
        let filter = doc! {
            "_id": id,
            "project_id": null,
            "status": QuoteStatus::Approved.as_str(),
        };
        let update = doc! { "$set": {
            "project_id": project_id,
            "updated_at": Self::now(),
        }};
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_update())
            .await
        {
            Ok(Some(quote)) => {
                info!("Project linked to quote");
                Ok(quote)
            }
            Ok(None) => {
                let quote = self.get_by_id(id).await?;
                if quote.project_id.is_some() {
                    Err(RepositoryError::already_exists(
                        "project already started for this quote",
                    ))
                } else {
                    Err(RepositoryError::validation(
                        "only an approved quote can be promoted to a project",
                    ))
                }
            }
            Err(e) => Err(RepositoryError::from(e)),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, project_id = %project_id))]
    async fn unlink_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<()> {
        let filter = doc! { "_id": id, "project_id": project_id };
        let update = doc! { "$set": {
            "project_id": null,
            "updated_at": Self::now(),
        }};
        self.collection
            .update_one(filter, update, None)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

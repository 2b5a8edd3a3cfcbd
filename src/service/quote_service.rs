use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::dto::quote_dto::{
    CreateQuoteRequest, File, QuoteResponseDto, QuoteStatusView, StageChange,
};
use crate::model::actor::Actor;
use crate::model::pipeline::PipelineState;
use crate::model::quote::{Quote, QuoteStatus};
use crate::repository::contract_repo::ContractRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;
use crate::util::minio::BlobStore;
use crate::util::stripe::amount_to_cents;

#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Public intake: create a quote and upload its attachments.
    async fn register_quote(
        &self,
        request: CreateQuoteRequest,
        files: Vec<File>,
    ) -> Result<Quote, ServiceError>;

    async fn get_quote(&self, actor: &Actor, id: ObjectId)
        -> Result<QuoteResponseDto, ServiceError>;
    async fn list_quotes(
        &self,
        actor: &Actor,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Quote>, ServiceError>;
    async fn update_quote_status(
        &self,
        actor: &Actor,
        id: ObjectId,
        status: QuoteStatus,
    ) -> Result<Quote, ServiceError>;

    /// Staff-only: assign the estimated price. Idempotent for the same value.
    async fn set_price(&self, actor: &Actor, id: ObjectId, price: f64)
        -> Result<Quote, ServiceError>;

    /// Staff-only: attach a contract template. The template must exist.
    async fn attach_contract(
        &self,
        actor: &Actor,
        id: ObjectId,
        contract_id: ObjectId,
    ) -> Result<Quote, ServiceError>;

    /// The approval gate: staff or the owning customer locks in acceptance
    /// of a priced quote. Re-approving is a safe no-op.
    async fn approve(&self, actor: &Actor, id: ObjectId) -> Result<Quote, ServiceError>;

    /// Staff-only: advance one pipeline stage. Monotonic per field;
    /// cross-field ordering is deliberately not enforced.
    async fn update_stage(
        &self,
        actor: &Actor,
        id: ObjectId,
        change: StageChange,
    ) -> Result<Quote, ServiceError>;

    /// Read-only client projection of a quote's pipeline progress.
    async fn status_view(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<QuoteStatusView, ServiceError>;
}

pub struct QuoteServiceImpl {
    quote_repo: Arc<dyn QuoteRepository>,
    contract_repo: Arc<dyn ContractRepository>,
    blob_store: Arc<dyn BlobStore>,
}

impl QuoteServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        contract_repo: Arc<dyn ContractRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        QuoteServiceImpl {
            quote_repo,
            contract_repo,
            blob_store,
        }
    }

    fn apply_stage_change(
        pipeline: &PipelineState,
        change: &StageChange,
    ) -> Result<PipelineState, ServiceError> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut updated = pipeline.clone();

        // Per-field monotonicity: a stage never moves backward.
        macro_rules! advance {
            ($field:ident, $new:expr, $label:literal) => {{
                if $new.rank() < pipeline.$field.rank() {
                    return Err(ServiceError::InvalidInput(format!(
                        "cannot move the {} stage backward",
                        $label
                    )));
                }
                updated.$field = $new;
            }};
        }

        match change {
            StageChange::Deposit { value, amount } => {
                advance!(deposit, *value, "deposit");
                if let Some(amount) = amount {
                    updated.deposit_amount = Some(*amount);
                }
                if value.is_complete() && updated.deposit_paid_at.is_none() {
                    updated.deposit_paid_at = Some(now);
                }
            }
            StageChange::Contract { value } => {
                advance!(contract, *value, "contract");
            }
            StageChange::Schedule {
                value,
                scheduled_date,
            } => {
                advance!(schedule, *value, "schedule");
                if let Some(date) = scheduled_date {
                    updated.scheduled_date = Some(date.clone());
                }
            }
            StageChange::Work { value } => {
                advance!(work, *value, "work");
                use crate::model::pipeline::WorkStatus;
                match value {
                    WorkStatus::InProgress if updated.work_started_at.is_none() => {
                        updated.work_started_at = Some(now);
                    }
                    WorkStatus::Completed => {
                        if updated.work_started_at.is_none() {
                            updated.work_started_at = Some(now.clone());
                        }
                        if updated.work_completed_at.is_none() {
                            updated.work_completed_at = Some(now);
                        }
                    }
                    _ => {}
                }
            }
            StageChange::Inspection { value } => {
                advance!(inspection, *value, "inspection");
            }
            StageChange::FinalPayment { .. } => {
                // Marking the final payment paid by hand would break the
                // invariant that "paid" implies a succeeded Payment record.
                return Err(ServiceError::InvalidInput(
                    "the final payment stage is driven by the payment pipeline".to_string(),
                ));
            }
            StageChange::Warranty { value } => {
                advance!(warranty, *value, "warranty");
            }
        }

        Ok(updated)
    }
}

#[async_trait]
impl QuoteService for QuoteServiceImpl {
    #[instrument(skip(self, request, files))]
    async fn register_quote(
        &self,
        request: CreateQuoteRequest,
        files: Vec<File>,
    ) -> Result<Quote, ServiceError> {
        info!("Registering new quote");

        let quote = Quote {
            id: None,
            name: request.name,
            email: request.email,
            phone: request.phone,
            company: request.company,
            description: request.description,
            project_type: request.project_type,
            size: request.size,
            location: request.location,
            timeline: request.timeline,
            budget: request.budget,
            estimated_price: None,
            contract_id: None,
            status: QuoteStatus::Pending,
            pipeline: PipelineState::default(),
            attachments: Vec::new(),
            project_id: None,
            payment_intent_id: None,
            payment_intent_amount: None,
            created_at: None,
            updated_at: None,
        };

        let mut inserted = self.quote_repo.create(quote).await.map_err(ServiceError::from)?;
        let quote_id = inserted
            .id
            .ok_or_else(|| ServiceError::InternalError("inserted quote has no id".to_string()))?;

        // Attachment uploads degrade gracefully: a failed upload is logged
        // and omitted, never a failed quote.
        let mut object_names = Vec::new();
        for file in &files {
            let extension = file
                .filename
                .rsplit('.')
                .next()
                .filter(|s| *s != file.filename)
                .map(|ext| format!(".{}", ext))
                .unwrap_or_default();
            let object_name =
                format!("quotes/{}/{}{}", quote_id, uuid::Uuid::new_v4(), extension);
            match self
                .blob_store
                .put_object(&object_name, file.content.clone(), Some(&file.content_type))
                .await
            {
                Ok(()) => object_names.push(object_name),
                Err(e) => warn!(
                    filename = %file.filename,
                    "Attachment upload failed, omitting: {}", e
                ),
            }
        }

        if !object_names.is_empty() {
            inserted = self
                .quote_repo
                .set_attachments(quote_id, object_names)
                .await
                .map_err(ServiceError::from)?;
        }

        info!(quote_id = %quote_id, "Quote registered");
        Ok(inserted)
    }

    #[instrument(skip(self, actor), fields(id = %id))]
    async fn get_quote(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<QuoteResponseDto, ServiceError> {
        actor.require_staff()?;
        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;

        let files = if quote.attachments.is_empty() {
            None
        } else {
            Some(
                quote
                    .attachments
                    .iter()
                    .map(|name| self.blob_store.download_link(name))
                    .collect(),
            )
        };

        Ok(QuoteResponseDto { quote, files })
    }

    #[instrument(skip(self, actor), fields(page, limit))]
    async fn list_quotes(
        &self,
        actor: &Actor,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Quote>, ServiceError> {
        actor.require_staff()?;
        self.quote_repo
            .list(page, limit)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self, actor), fields(id = %id, status = ?status))]
    async fn update_quote_status(
        &self,
        actor: &Actor,
        id: ObjectId,
        status: QuoteStatus,
    ) -> Result<Quote, ServiceError> {
        actor.require_staff()?;
        self.quote_repo
            .update_status(id, status)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self, actor), fields(id = %id, price = price))]
    async fn set_price(
        &self,
        actor: &Actor,
        id: ObjectId,
        price: f64,
    ) -> Result<Quote, ServiceError> {
        actor.require_staff()?;

        if !price.is_finite() || price <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "estimated price must be a positive amount".to_string(),
            ));
        }

        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;
        if let Some(current) = quote.estimated_price {
            if amount_to_cents(current) == amount_to_cents(price) {
                // Same value twice is a no-op.
                return Ok(quote);
            }
        }

        let updated = self
            .quote_repo
            .set_estimated_price(id, price)
            .await
            .map_err(ServiceError::from)?;
        info!("Estimated price set");
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(id = %id, contract_id = %contract_id))]
    async fn attach_contract(
        &self,
        actor: &Actor,
        id: ObjectId,
        contract_id: ObjectId,
    ) -> Result<Quote, ServiceError> {
        actor.require_staff()?;

        // The template must exist before it can be referenced.
        self.contract_repo
            .get_by_id(contract_id)
            .await
            .map_err(ServiceError::from)?;

        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;
        if quote.contract_id == Some(contract_id) {
            return Ok(quote);
        }

        self.quote_repo
            .set_contract(id, contract_id)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self, actor), fields(id = %id))]
    async fn approve(&self, actor: &Actor, id: ObjectId) -> Result<Quote, ServiceError> {
        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;
        actor.require_quote_access(&quote)?;

        if quote.is_approved() {
            // Safe no-op: return current state, do not rewrite anything.
            info!("Quote already approved");
            return Ok(quote);
        }

        if quote.estimated_price.is_none() {
            return Err(ServiceError::IllegalState(
                "cannot approve a quote without an estimated price".to_string(),
            ));
        }

        let approved = self.quote_repo.approve(id).await.map_err(ServiceError::from)?;
        info!("Quote approved");
        Ok(approved)
    }

    #[instrument(skip(self, actor, change), fields(id = %id))]
    async fn update_stage(
        &self,
        actor: &Actor,
        id: ObjectId,
        change: StageChange,
    ) -> Result<Quote, ServiceError> {
        actor.require_staff()?;

        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;
        let updated = Self::apply_stage_change(&quote.pipeline, &change)?;
        if updated == quote.pipeline {
            return Ok(quote);
        }

        let result = self
            .quote_repo
            .update_pipeline(id, &quote.pipeline, &updated)
            .await;
        match &result {
            Ok(_) => info!("Pipeline stage updated"),
            Err(e) => error!("Failed to update pipeline stage: {e}"),
        }
        result.map_err(ServiceError::from)
    }

    #[instrument(skip(self, actor), fields(id = %id))]
    async fn status_view(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<QuoteStatusView, ServiceError> {
        let quote = self.quote_repo.get_by_id(id).await.map_err(ServiceError::from)?;
        actor.require_quote_access(&quote)?;
        Ok(QuoteStatusView::from_quote(&quote))
    }
}

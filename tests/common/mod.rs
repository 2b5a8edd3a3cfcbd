//! In-memory test doubles sharing the conditional-write semantics of the
//! Mongo repositories, so lifecycle behavior can be exercised without a
//! running database, blob store, or payment processor.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bson::oid::ObjectId;

use crestline_backend::dto::quote_dto::CreateQuoteRequest;
use crestline_backend::model::actor::{Actor, Role};
use crestline_backend::model::contract::Contract;
use crestline_backend::model::payment::{Payment, PaymentStatus};
use crestline_backend::model::pipeline::{FinalPaymentStatus, PipelineState};
use crestline_backend::model::project::Project;
use crestline_backend::model::quote::{Quote, QuoteStatus};
use crestline_backend::repository::contract_repo::ContractRepository;
use crestline_backend::repository::payment_repo::PaymentRepository;
use crestline_backend::repository::project_repo::ProjectRepository;
use crestline_backend::repository::quote_repo::QuoteRepository;
use crestline_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use crestline_backend::util::minio::{BlobError, BlobStore};
use crestline_backend::util::stripe::{
    IntentHandle, IntentMetadata, IntentStatus, PaymentProcessor, ProcessorError,
};

use std::sync::Arc;

use crestline_backend::service::payment_service::{PaymentService, PaymentServiceImpl};
use crestline_backend::service::project_service::{ProjectService, ProjectServiceImpl};
use crestline_backend::service::quote_service::{QuoteService, QuoteServiceImpl};

/// Fully-wired service stack over the in-memory doubles. The raw handles
/// stay accessible so tests can script the processor or inspect records.
pub struct TestEnv {
    pub quote_repo: Arc<MemoryQuoteRepository>,
    pub payment_repo: Arc<MemoryPaymentRepository>,
    pub contract_repo: Arc<MemoryContractRepository>,
    pub project_repo: Arc<MemoryProjectRepository>,
    pub blob_store: Arc<MemoryBlobStore>,
    pub processor: Arc<FakeProcessor>,
    pub quotes: Arc<dyn QuoteService>,
    pub payments: Arc<dyn PaymentService>,
    pub projects: Arc<dyn ProjectService>,
}

impl TestEnv {
    pub fn new() -> Self {
        let quote_repo = Arc::new(MemoryQuoteRepository::new());
        let payment_repo = Arc::new(MemoryPaymentRepository::new());
        let contract_repo = Arc::new(MemoryContractRepository::new());
        let project_repo = Arc::new(MemoryProjectRepository::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        let processor = Arc::new(FakeProcessor::new());

        let quotes = Arc::new(QuoteServiceImpl::new(
            quote_repo.clone(),
            contract_repo.clone(),
            blob_store.clone(),
        )) as Arc<dyn QuoteService>;
        let payments = Arc::new(PaymentServiceImpl::new(
            quote_repo.clone(),
            payment_repo.clone(),
            processor.clone(),
            "usd".to_string(),
        )) as Arc<dyn PaymentService>;
        let projects = Arc::new(ProjectServiceImpl::new(
            quote_repo.clone(),
            project_repo.clone(),
        )) as Arc<dyn ProjectService>;

        TestEnv {
            quote_repo,
            payment_repo,
            contract_repo,
            project_repo,
            blob_store,
            processor,
            quotes,
            payments,
            projects,
        }
    }

    /// Intake + pricing + approval in one step; most payment and promotion
    /// tests start from an approved, priced quote.
    pub async fn approved_quote(&self, email: &str, price: f64) -> Quote {
        let quote = self
            .quotes
            .register_quote(quote_request(email), vec![])
            .await
            .unwrap();
        let id = quote.id.unwrap();
        self.quotes.set_price(&staff(), id, price).await.unwrap();
        self.quotes.approve(&staff(), id).await.unwrap()
    }
}

pub fn staff() -> Actor {
    Actor {
        id: "staff-1".to_string(),
        email: "staff@crestline.test".to_string(),
        role: Role::Staff,
    }
}

pub fn customer(email: &str) -> Actor {
    Actor {
        id: "cust-1".to_string(),
        email: email.to_string(),
        role: Role::Customer,
    }
}

pub fn quote_request(email: &str) -> CreateQuoteRequest {
    CreateQuoteRequest {
        name: "Dana Whitfield".to_string(),
        email: email.to_string(),
        phone: "+15550100".to_string(),
        company: None,
        description: "Kitchen remodel with new cabinetry and flooring".to_string(),
        project_type: Some("Kitchen remodel".to_string()),
        size: Some("30 sqm".to_string()),
        location: Some("Portland, OR".to_string()),
        timeline: None,
        budget: None,
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Quotes

#[derive(Default)]
pub struct MemoryQuoteRepository {
    quotes: Mutex<HashMap<ObjectId, Quote>>,
    lose_next_pipeline_update: Mutex<bool>,
    lose_next_mark_paid: Mutex<bool>,
}

impl MemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next optimistic pipeline write lose to a concurrent writer.
    pub fn lose_next_pipeline_update(&self) {
        *self.lose_next_pipeline_update.lock().unwrap() = true;
    }

    /// Make the next `mark_final_payment_paid` lose to a concurrent
    /// confirmation: the winner's stage write lands, but its Payment
    /// record has not been finalized yet.
    pub fn lose_next_mark_paid(&self) {
        *self.lose_next_mark_paid.lock().unwrap() = true;
    }
}

#[async_trait]
impl QuoteRepository for MemoryQuoteRepository {
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote> {
        let mut new_quote = quote;
        let id = ObjectId::new();
        new_quote.id = Some(id);
        let time = now();
        new_quote.created_at = Some(time.clone());
        new_quote.updated_at = Some(time);
        self.quotes
            .lock()
            .unwrap()
            .insert(id, new_quote.clone());
        Ok(new_quote)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        self.quotes
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))
    }

    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let quotes = self.quotes.lock().unwrap();
        let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        Ok(quotes.values().skip(skip).take(limit as usize).cloned().collect())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.quotes.lock().unwrap().len() as u64)
    }

    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        quote.status = status;
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn set_estimated_price(&self, id: ObjectId, price: f64) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        quote.estimated_price = Some(price);
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn set_contract(&self, id: ObjectId, contract_id: ObjectId) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        quote.contract_id = Some(contract_id);
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn set_attachments(
        &self,
        id: ObjectId,
        attachments: Vec<String>,
    ) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        quote.attachments = attachments;
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn approve(&self, id: ObjectId) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        if quote.estimated_price.is_none() {
            return Err(RepositoryError::validation(
                "cannot approve a quote without an estimated price",
            ));
        }
        quote.status = QuoteStatus::Approved;
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn update_pipeline(
        &self,
        id: ObjectId,
        expected: &PipelineState,
        updated: &PipelineState,
    ) -> RepositoryResult<Quote> {
        if std::mem::take(&mut *self.lose_next_pipeline_update.lock().unwrap()) {
            return Err(RepositoryError::conflict(
                "pipeline changed concurrently; re-read and retry",
            ));
        }
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        if &quote.pipeline != expected {
            return Err(RepositoryError::conflict(
                "pipeline changed concurrently; re-read and retry",
            ));
        }
        quote.pipeline = updated.clone();
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn record_payment_intent(
        &self,
        id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        if quote.pipeline.final_payment.is_complete() {
            return Err(RepositoryError::already_exists(
                "final payment already collected for this quote",
            ));
        }
        quote.payment_intent_id = Some(intent_id.to_string());
        quote.payment_intent_amount = Some(amount);
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn mark_final_payment_paid(
        &self,
        id: ObjectId,
        expected_amount: f64,
    ) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        if std::mem::take(&mut *self.lose_next_mark_paid.lock().unwrap()) {
            // The winner's conditional write lands first.
            quote.pipeline.final_payment = FinalPaymentStatus::Paid;
            quote.pipeline.final_payment_paid_at = Some(now());
            return Err(RepositoryError::already_exists(
                "final payment already collected for this quote",
            ));
        }
        if quote.pipeline.final_payment.is_complete() {
            return Err(RepositoryError::already_exists(
                "final payment already collected for this quote",
            ));
        }
        if quote.estimated_price != Some(expected_amount) {
            return Err(RepositoryError::conflict(
                "quote changed during payment confirmation; re-read and retry",
            ));
        }
        quote.pipeline.final_payment = FinalPaymentStatus::Paid;
        quote.pipeline.final_payment_paid_at = Some(now());
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn link_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))?;
        if quote.project_id.is_some() {
            return Err(RepositoryError::already_exists(
                "project already started for this quote",
            ));
        }
        if quote.status != QuoteStatus::Approved {
            return Err(RepositoryError::validation(
                "only an approved quote can be promoted to a project",
            ));
        }
        quote.project_id = Some(project_id);
        quote.updated_at = Some(now());
        Ok(quote.clone())
    }

    async fn unlink_project(&self, id: ObjectId, project_id: ObjectId) -> RepositoryResult<()> {
        let mut quotes = self.quotes.lock().unwrap();
        if let Some(quote) = quotes.get_mut(&id) {
            if quote.project_id == Some(project_id) {
                quote.project_id = None;
                quote.updated_at = Some(now());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payments

#[derive(Default)]
pub struct MemoryPaymentRepository {
    payments: Mutex<Vec<Payment>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Payment> {
        self.payments.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn create_pending(
        &self,
        quote_id: ObjectId,
        intent_id: &str,
        amount: f64,
    ) -> RepositoryResult<Payment> {
        let mut payments = self.payments.lock().unwrap();
        payments.retain(|p| !(p.quote_id == quote_id && p.status == PaymentStatus::Pending));
        let payment = Payment {
            id: Some(ObjectId::new()),
            quote_id,
            intent_id: intent_id.to_string(),
            amount,
            status: PaymentStatus::Pending,
            created_at: now(),
            confirmed_at: None,
        };
        payments.push(payment.clone());
        Ok(payment)
    }

    async fn finalize_succeeded(&self, intent_id: &str) -> RepositoryResult<Option<Payment>> {
        let mut payments = self.payments.lock().unwrap();
        for payment in payments.iter_mut() {
            if payment.intent_id == intent_id && payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Succeeded;
                payment.confirmed_at = Some(now());
                return Ok(Some(payment.clone()));
            }
        }
        Ok(None)
    }

    async fn insert_succeeded(&self, payment: Payment) -> RepositoryResult<Payment> {
        let mut new_payment = payment;
        new_payment.id = Some(ObjectId::new());
        new_payment.status = PaymentStatus::Succeeded;
        if new_payment.confirmed_at.is_none() {
            new_payment.confirmed_at = Some(now());
        }
        self.payments.lock().unwrap().push(new_payment.clone());
        Ok(new_payment)
    }

    async fn find_succeeded_by_quote(
        &self,
        quote_id: ObjectId,
    ) -> RepositoryResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.quote_id == quote_id && p.status == PaymentStatus::Succeeded)
            .cloned())
    }

    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.quote_id == quote_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Contracts and projects

#[derive(Default)]
pub struct MemoryContractRepository {
    contracts: Mutex<HashMap<ObjectId, Contract>>,
}

impl MemoryContractRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractRepository for MemoryContractRepository {
    async fn create(&self, contract: Contract) -> RepositoryResult<Contract> {
        let mut new_contract = contract;
        let id = ObjectId::new();
        new_contract.id = Some(id);
        new_contract.created_at = Some(now());
        self.contracts
            .lock()
            .unwrap()
            .insert(id, new_contract.clone());
        Ok(new_contract)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Contract> {
        self.contracts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Contract not found for ID: {}", id))
            })
    }

    async fn list(&self) -> RepositoryResult<Vec<Contract>> {
        Ok(self.contracts.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryProjectRepository {
    projects: Mutex<HashMap<ObjectId, Project>>,
    pub fail_next_create: Mutex<bool>,
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_create(&self) {
        *self.fail_next_create.lock().unwrap() = true;
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn create(&self, project: Project) -> RepositoryResult<Project> {
        if std::mem::take(&mut *self.fail_next_create.lock().unwrap()) {
            return Err(RepositoryError::database("simulated insert failure"));
        }
        let id = project
            .id
            .ok_or_else(|| RepositoryError::validation("project id must be set before insertion"))?;
        self.projects.lock().unwrap().insert(id, project.clone());
        Ok(project)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Project> {
        self.projects
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Project not found for ID: {}", id)))
    }

    async fn list(&self) -> RepositoryResult<Vec<Project>> {
        Ok(self.projects.lock().unwrap().values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Blob store

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(
        &self,
        object_name: &str,
        data: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<(), BlobError> {
        self.objects
            .lock()
            .unwrap()
            .insert(object_name.to_string(), data);
        Ok(())
    }

    async fn remove_object(&self, object_name: &str) -> Result<(), BlobError> {
        self.objects.lock().unwrap().remove(object_name);
        Ok(())
    }

    fn download_link(&self, object_name: &str) -> String {
        format!("http://blobs.test/{}", object_name)
    }
}

// ---------------------------------------------------------------------------
// Payment processor

struct FakeIntent {
    amount: f64,
    status: IntentStatus,
}

/// Scriptable stand-in for the external payment processor. Intents start
/// pending; tests flip them with [`FakeProcessor::settle`] or
/// [`FakeProcessor::fail_intent`].
#[derive(Default)]
pub struct FakeProcessor {
    intents: Mutex<HashMap<String, FakeIntent>>,
    counter: Mutex<u64>,
    pub unreachable: Mutex<bool>,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settle(&self, intent_id: &str) {
        if let Some(intent) = self.intents.lock().unwrap().get_mut(intent_id) {
            intent.status = IntentStatus::Succeeded;
        }
    }

    pub fn fail_intent(&self, intent_id: &str) {
        if let Some(intent) = self.intents.lock().unwrap().get_mut(intent_id) {
            intent.status = IntentStatus::Failed;
        }
    }

    pub fn go_offline(&self) {
        *self.unreachable.lock().unwrap() = true;
    }

    pub fn intent_count(&self) -> usize {
        self.intents.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_intent(
        &self,
        amount: f64,
        _currency: &str,
        _metadata: &IntentMetadata,
    ) -> Result<IntentHandle, ProcessorError> {
        if *self.unreachable.lock().unwrap() {
            return Err(ProcessorError::Unreachable(
                "simulated outage".to_string(),
            ));
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let id = format!("pi_test_{}", *counter);
        self.intents.lock().unwrap().insert(
            id.clone(),
            FakeIntent {
                amount,
                status: IntentStatus::Pending,
            },
        );
        Ok(IntentHandle {
            id,
            amount,
            currency: "usd".to_string(),
        })
    }

    async fn retrieve_intent(
        &self,
        intent_id: &str,
    ) -> Result<(IntentStatus, f64), ProcessorError> {
        if *self.unreachable.lock().unwrap() {
            return Err(ProcessorError::Unreachable(
                "simulated outage".to_string(),
            ));
        }
        let intents = self.intents.lock().unwrap();
        let intent = intents
            .get(intent_id)
            .ok_or_else(|| ProcessorError::Rejected(format!("no such intent: {}", intent_id)))?;
        Ok((intent.status, intent.amount))
    }
}

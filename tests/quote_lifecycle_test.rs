mod common;

use common::{customer, quote_request, staff, TestEnv};
use crestline_backend::dto::quote_dto::File;
use crestline_backend::model::quote::QuoteStatus;
use crestline_backend::service::contract_service::{ContractService, ContractServiceImpl};
use crestline_backend::dto::contract_dto::CreateContractRequest;
use crestline_backend::util::error::ServiceError;
use bson::oid::ObjectId;

#[tokio::test]
async fn register_quote_starts_pending_with_empty_pipeline() {
    let env = TestEnv::new();
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), vec![])
        .await
        .unwrap();

    assert_eq!(quote.status, QuoteStatus::Pending);
    assert!(quote.estimated_price.is_none());
    assert!(quote.project_id.is_none());
    assert_eq!(quote.pipeline.current_step_index(), 0);
}

#[tokio::test]
async fn register_quote_uploads_attachments() {
    let env = TestEnv::new();
    let files = vec![File {
        filename: "plans.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        content: vec![1, 2, 3],
        size: 3,
    }];
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), files)
        .await
        .unwrap();

    assert_eq!(quote.attachments.len(), 1);
    assert_eq!(env.blob_store.object_count(), 1);
}

#[tokio::test]
async fn approve_without_price_is_rejected() {
    let env = TestEnv::new();
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), vec![])
        .await
        .unwrap();
    let id = quote.id.unwrap();

    let err = env
        .quotes
        .approve(&customer("dana@example.com"), id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::IllegalState(_)));
}

#[tokio::test]
async fn approve_is_idempotent() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let again = env
        .quotes
        .approve(&customer("dana@example.com"), id)
        .await
        .unwrap();
    assert_eq!(again.status, QuoteStatus::Approved);
}

#[tokio::test]
async fn customer_cannot_approve_someone_elses_quote() {
    let env = TestEnv::new();
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), vec![])
        .await
        .unwrap();
    let id = quote.id.unwrap();
    env.quotes.set_price(&staff(), id, 15000.0).await.unwrap();

    let err = env
        .quotes
        .approve(&customer("intruder@example.com"), id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn set_price_rejects_non_positive_and_customers() {
    let env = TestEnv::new();
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), vec![])
        .await
        .unwrap();
    let id = quote.id.unwrap();

    let err = env.quotes.set_price(&staff(), id, 0.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let err = env
        .quotes
        .set_price(&customer("dana@example.com"), id, 100.0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn attach_contract_requires_existing_template() {
    let env = TestEnv::new();
    let quote = env
        .quotes
        .register_quote(quote_request("dana@example.com"), vec![])
        .await
        .unwrap();
    let id = quote.id.unwrap();

    let err = env
        .quotes
        .attach_contract(&staff(), id, ObjectId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let contracts = ContractServiceImpl::new(env.contract_repo.clone());
    let contract = contracts
        .create_contract(
            &staff(),
            CreateContractRequest {
                title: "Standard remodel agreement".to_string(),
                document_url: None,
                body: Some("Scope of work...".to_string()),
            },
        )
        .await
        .unwrap();

    let updated = env
        .quotes
        .attach_contract(&staff(), id, contract.id.unwrap())
        .await
        .unwrap();
    assert_eq!(updated.contract_id, contract.id);
}

#[tokio::test]
async fn contract_template_needs_url_or_body() {
    let env = TestEnv::new();
    let contracts = ContractServiceImpl::new(env.contract_repo.clone());
    let err = contracts
        .create_contract(
            &staff(),
            CreateContractRequest {
                title: "Empty template".to_string(),
                document_url: None,
                body: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn status_view_is_visible_to_owner_but_not_others() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let view = env
        .quotes
        .status_view(&customer("dana@example.com"), id)
        .await
        .unwrap();
    assert_eq!(view.status, QuoteStatus::Approved);
    assert_eq!(view.current_step, 0);

    let err = env
        .quotes
        .status_view(&customer("intruder@example.com"), id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

mod common;

use common::{customer, staff, TestEnv};
use crestline_backend::dto::quote_dto::StageChange;
use crestline_backend::model::pipeline::{
    ContractStatus, DepositStatus, FinalPaymentStatus, InspectionStatus, ScheduleStatus,
    WarrantyStatus, WorkStatus, TOTAL_STAGES,
};
use crestline_backend::util::error::ServiceError;

#[tokio::test]
async fn stages_advance_and_never_move_backward() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let updated = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Deposit {
                value: DepositStatus::Paid,
                amount: Some(3000.0),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.pipeline.deposit, DepositStatus::Paid);
    assert_eq!(updated.pipeline.deposit_amount, Some(3000.0));
    assert!(updated.pipeline.deposit_paid_at.is_some());

    let err = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Deposit {
                value: DepositStatus::Required,
                amount: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn same_stage_value_is_a_no_op() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let first = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap();
    let second = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.pipeline, second.pipeline);
}

#[tokio::test]
async fn completing_work_fills_both_timestamps() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let updated = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Work {
                value: WorkStatus::Completed,
            },
        )
        .await
        .unwrap();
    assert!(updated.pipeline.work_started_at.is_some());
    assert!(updated.pipeline.work_completed_at.is_some());
}

#[tokio::test]
async fn final_payment_stage_cannot_be_set_by_hand() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let err = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::FinalPayment {
                value: FinalPaymentStatus::Paid,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn losing_a_concurrent_stage_write_is_a_conflict() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    // The optimistic pipeline write goes to a concurrent writer; the
    // loser is told to re-read instead of having its write applied.
    env.quote_repo.lose_next_pipeline_update();
    let err = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // A fresh attempt against current state succeeds.
    let updated = env
        .quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.pipeline.contract, ContractStatus::Signed);
}

#[tokio::test]
async fn stage_updates_are_staff_only() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();

    let err = env
        .quotes
        .update_stage(
            &customer("dana@example.com"),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn full_lifecycle_reaches_the_warranty_step() {
    let env = TestEnv::new();
    let quote = env.approved_quote("dana@example.com", 15000.0).await;
    let id = quote.id.unwrap();
    let dana = customer("dana@example.com");

    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Deposit {
                value: DepositStatus::Waived,
                amount: None,
            },
        )
        .await
        .unwrap();
    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Contract {
                value: ContractStatus::Signed,
            },
        )
        .await
        .unwrap();
    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Schedule {
                value: ScheduleStatus::Scheduled,
                scheduled_date: Some("2026-09-15".to_string()),
            },
        )
        .await
        .unwrap();
    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Work {
                value: WorkStatus::Completed,
            },
        )
        .await
        .unwrap();
    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Inspection {
                value: InspectionStatus::Passed,
            },
        )
        .await
        .unwrap();

    let intent = env.payments.create_intent(&dana, id).await.unwrap();
    env.processor.settle(&intent.intent_id);
    env.payments
        .confirm_payment(&dana, id, &intent.intent_id)
        .await
        .unwrap();

    // Everything settled but the warranty stage: the job sits at step 6.
    let view = env.quotes.status_view(&dana, id).await.unwrap();
    assert_eq!(view.current_step, TOTAL_STAGES - 1);

    env.quotes
        .update_stage(
            &staff(),
            id,
            StageChange::Warranty {
                value: WarrantyStatus::Expired,
            },
        )
        .await
        .unwrap();
    let view = env.quotes.status_view(&dana, id).await.unwrap();
    assert_eq!(view.current_step, TOTAL_STAGES);
    assert_eq!(view.progress, 1.0);

    // The finished job can now be promoted to the public gallery.
    env.projects.start_project(&staff(), id).await.unwrap();
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::pipeline::{
    ContractStatus, DepositStatus, FinalPaymentStatus, InspectionStatus, PipelineState,
    ScheduleStatus, WarrantyStatus, WorkStatus, TOTAL_STAGES,
};
use crate::model::quote::{Quote, QuoteStatus};

/// An uploaded file pulled out of the multipart request.
#[derive(Debug, Clone)]
pub struct File {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 20))]
    pub phone: String,

    pub company: Option<String>,

    #[validate(length(min = 10, max = 5000))]
    pub description: String,

    pub project_type: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub timeline: Option<String>,
    pub budget: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetPriceRequest {
    #[validate(range(min = 0.01))]
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachContractRequest {
    #[validate(length(equal = 24))] // ObjectId hex string
    pub contract_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuoteStatusRequest {
    pub status: QuoteStatus,
}

/// One stage mutation. Each variant targets a single field; the service
/// enforces per-field monotonicity but deliberately not cross-field order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageChange {
    Deposit {
        value: DepositStatus,
        amount: Option<f64>,
    },
    Contract {
        value: ContractStatus,
    },
    Schedule {
        value: ScheduleStatus,
        scheduled_date: Option<String>,
    },
    Work {
        value: WorkStatus,
    },
    Inspection {
        value: InspectionStatus,
    },
    FinalPayment {
        value: FinalPaymentStatus,
    },
    Warranty {
        value: WarrantyStatus,
    },
}

/// Staff-facing quote detail, attachments resolved to download links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponseDto {
    pub quote: Quote,
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    Complete,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageView {
    pub stage: String,
    pub value: String,
    pub state: StageProgress,
}

/// Read-only client projection of a quote's pipeline. Deliberately omits
/// staff-only fields such as the raw processor intent id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteStatusView {
    pub quote_id: String,
    pub status: QuoteStatus,
    pub estimated_price: Option<f64>,
    pub stages: Vec<StageView>,
    pub current_step: usize,
    pub total_steps: usize,
    pub progress: f64,

    pub deposit_amount: Option<f64>,
    pub deposit_paid_at: Option<String>,
    pub scheduled_date: Option<String>,
    pub work_started_at: Option<String>,
    pub work_completed_at: Option<String>,
    pub final_payment_paid_at: Option<String>,
}

impl QuoteStatusView {
    pub fn from_quote(quote: &Quote) -> Self {
        let pipeline = &quote.pipeline;
        let current = pipeline.current_step_index();
        let stages = Self::stage_views(pipeline, current);

        QuoteStatusView {
            quote_id: quote
                .id
                .map(|id| id.to_hex())
                .unwrap_or_default(),
            status: quote.status,
            estimated_price: quote.estimated_price,
            stages,
            current_step: current,
            total_steps: TOTAL_STAGES,
            progress: pipeline.progress(),
            deposit_amount: pipeline.deposit_amount,
            deposit_paid_at: pipeline.deposit_paid_at.clone(),
            scheduled_date: pipeline.scheduled_date.clone(),
            work_started_at: pipeline.work_started_at.clone(),
            work_completed_at: pipeline.work_completed_at.clone(),
            final_payment_paid_at: pipeline.final_payment_paid_at.clone(),
        }
    }

    fn stage_views(pipeline: &PipelineState, current: usize) -> Vec<StageView> {
        let values = [
            serde_json::to_value(pipeline.deposit),
            serde_json::to_value(pipeline.contract),
            serde_json::to_value(pipeline.schedule),
            serde_json::to_value(pipeline.work),
            serde_json::to_value(pipeline.inspection),
            serde_json::to_value(pipeline.final_payment),
            serde_json::to_value(pipeline.warranty),
        ];

        PipelineState::stage_names()
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (name, value))| {
                let state = if i < current {
                    StageProgress::Complete
                } else if i == current {
                    StageProgress::Current
                } else {
                    StageProgress::Upcoming
                };
                StageView {
                    stage: name.to_string(),
                    value: value
                        .ok()
                        .and_then(|v| v.as_str().map(|s| s.to_string()))
                        .unwrap_or_default(),
                    state,
                }
            })
            .collect()
    }
}

use serde::{Deserialize, Serialize};

/// Number of tracked stages between signed quote and expired warranty.
pub const TOTAL_STAGES: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Required,
    Waived,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Awaiting,
    Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Awaiting,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    Passed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalPaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    Active,
    Expired,
}

impl DepositStatus {
    pub fn rank(&self) -> u8 {
        match self {
            DepositStatus::Required => 0,
            DepositStatus::Waived => 1,
            DepositStatus::Paid => 2,
        }
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self, DepositStatus::Required)
    }
}

impl ContractStatus {
    pub fn rank(&self) -> u8 {
        match self {
            ContractStatus::Awaiting => 0,
            ContractStatus::Signed => 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ContractStatus::Signed)
    }
}

impl ScheduleStatus {
    pub fn rank(&self) -> u8 {
        match self {
            ScheduleStatus::Awaiting => 0,
            ScheduleStatus::Scheduled => 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ScheduleStatus::Scheduled)
    }
}

impl WorkStatus {
    pub fn rank(&self) -> u8 {
        match self {
            WorkStatus::NotStarted => 0,
            WorkStatus::InProgress => 1,
            WorkStatus::Completed => 2,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, WorkStatus::Completed)
    }
}

impl InspectionStatus {
    pub fn rank(&self) -> u8 {
        match self {
            InspectionStatus::Pending => 0,
            InspectionStatus::Passed => 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, InspectionStatus::Passed)
    }
}

impl FinalPaymentStatus {
    pub fn rank(&self) -> u8 {
        match self {
            FinalPaymentStatus::Pending => 0,
            FinalPaymentStatus::Paid => 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, FinalPaymentStatus::Paid)
    }
}

impl WarrantyStatus {
    pub fn rank(&self) -> u8 {
        match self {
            WarrantyStatus::Active => 0,
            WarrantyStatus::Expired => 1,
        }
    }

    /// An active warranty still counts as an unfinished stage in the
    /// progress derivation. A fully-serviced job therefore sits at step 6
    /// until the warranty expires. Matches the portal's historical
    /// behavior; see DESIGN.md before changing.
    pub fn is_complete(&self) -> bool {
        matches!(self, WarrantyStatus::Expired)
    }
}

/// The seven tracked stage fields of a quote, each independently settable
/// by staff and monotonic per field, plus display-only timestamps/amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub deposit: DepositStatus,
    pub contract: ContractStatus,
    pub schedule: ScheduleStatus,
    pub work: WorkStatus,
    pub inspection: InspectionStatus,
    pub final_payment: FinalPaymentStatus,
    pub warranty: WarrantyStatus,

    // Display-only; never gate a transition.
    pub deposit_amount: Option<f64>,
    pub deposit_paid_at: Option<String>,
    pub scheduled_date: Option<String>,
    pub work_started_at: Option<String>,
    pub work_completed_at: Option<String>,
    pub final_payment_paid_at: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState {
            deposit: DepositStatus::Required,
            contract: ContractStatus::Awaiting,
            schedule: ScheduleStatus::Awaiting,
            work: WorkStatus::NotStarted,
            inspection: InspectionStatus::Pending,
            final_payment: FinalPaymentStatus::Pending,
            warranty: WarrantyStatus::Active,
            deposit_amount: None,
            deposit_paid_at: None,
            scheduled_date: None,
            work_started_at: None,
            work_completed_at: None,
            final_payment_paid_at: None,
        }
    }
}

impl PipelineState {
    /// Completion flags in declared stage order.
    pub fn stage_completion(&self) -> [bool; TOTAL_STAGES] {
        [
            self.deposit.is_complete(),
            self.contract.is_complete(),
            self.schedule.is_complete(),
            self.work.is_complete(),
            self.inspection.is_complete(),
            self.final_payment.is_complete(),
            self.warranty.is_complete(),
        ]
    }

    /// Index of the first stage that is not yet complete. Equals
    /// `TOTAL_STAGES` once every stage, warranty included, is terminal.
    pub fn current_step_index(&self) -> usize {
        self.stage_completion()
            .iter()
            .position(|done| !done)
            .unwrap_or(TOTAL_STAGES)
    }

    /// Fraction of the pipeline completed, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        self.current_step_index() as f64 / TOTAL_STAGES as f64
    }

    pub fn stage_names() -> [&'static str; TOTAL_STAGES] {
        [
            "deposit",
            "contract",
            "schedule",
            "work",
            "inspection",
            "final_payment",
            "warranty",
        ]
    }
}

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::pipeline::PipelineState;

/// Coarse business status of a quote, distinct from the fine-grained
/// pipeline stages tracked in [`PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Reviewed,
    Quoted,
    Contacted,
    Approved,
    Closed,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Reviewed => "reviewed",
            QuoteStatus::Quoted => "quoted",
            QuoteStatus::Contacted => "contacted",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Closed => "closed",
        }
    }
}

/// One record per customer request; the single source of truth for
/// pipeline state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,

    // Contact
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,

    // Project description
    pub description: String,
    pub project_type: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub timeline: Option<String>,
    pub budget: Option<String>,

    // Commercial fields, staff-set
    pub estimated_price: Option<f64>,
    pub contract_id: Option<ObjectId>,

    pub status: QuoteStatus,
    pub pipeline: PipelineState,

    /// Blob-store object names for uploaded files.
    pub attachments: Vec<String>,

    /// Set exactly once by project promotion.
    pub project_id: Option<ObjectId>,

    // Payment-intent bookkeeping. Staff-only; never exposed through the
    // client status view.
    pub payment_intent_id: Option<String>,
    pub payment_intent_amount: Option<f64>,

    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Quote {
    pub fn is_approved(&self) -> bool {
        self.status == QuoteStatus::Approved
    }
}

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One record per charge attempt against a quote. Created pending when a
/// payment intent is requested; finalized to succeeded only on a confirmed
/// processor success. Single-currency system, so no currency field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_id: ObjectId,
    /// External processor intent id.
    pub intent_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: String,
    pub confirmed_at: Option<String>,
}

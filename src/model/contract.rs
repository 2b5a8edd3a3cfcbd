use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Reusable contract template. Many quotes may reference one contract;
/// a missing reference degrades to "contract not found" at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub title: String,
    /// Either a stored document URL or a literal text body.
    pub document_url: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<String>,
}

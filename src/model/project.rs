use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Project materialized from an approved quote. Carries a copy of the
/// quote's descriptive fields at promotion time; later quote edits do not
/// propagate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_id: ObjectId,
    pub title: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub year: i32,
    pub description: String,
    pub estimated_price: Option<f64>,
    pub highlights: Vec<String>,
    pub images: Vec<String>,
    pub created_at: String,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateContractRequest {
    #[validate(length(min = 2, max = 200))]
    pub title: String,

    /// Either a stored document URL or a literal text body must be given;
    /// the service rejects a template with neither.
    #[validate(url)]
    pub document_url: Option<String>,

    pub body: Option<String>,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Returned to the paying party after intent creation. The handle is what
/// the front-end hands to the processor's payment element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub intent_id: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 255))]
    pub intent_id: String,
}

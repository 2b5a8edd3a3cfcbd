use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::dto::payment_dto::ConfirmPaymentRequest;
use crate::handler::parse_object_id;
use crate::model::actor::Actor;
use crate::service::payment_service::PaymentService;
use crate::util::error::HandlerError;

pub async fn create_intent_handler(
    State(service): State<Arc<dyn PaymentService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let intent = service
        .create_intent(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(intent))
}

pub async fn confirm_payment_handler(
    State(service): State<Arc<dyn PaymentService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let payment = service
        .confirm_payment(&actor, id, &payload.intent_id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(payment))
}

pub async fn list_payments_handler(
    State(service): State<Arc<dyn PaymentService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let payments = service
        .list_payments(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(payments))
}

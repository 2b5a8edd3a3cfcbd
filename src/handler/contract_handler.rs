use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::dto::contract_dto::CreateContractRequest;
use crate::handler::parse_object_id;
use crate::model::actor::Actor;
use crate::service::contract_service::ContractService;
use crate::util::error::HandlerError;

pub async fn create_contract_handler(
    State(service): State<Arc<dyn ContractService>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateContractRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let created = service
        .create_contract(&actor, payload)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(created))
}

pub async fn get_contract_handler(
    State(service): State<Arc<dyn ContractService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "contract")?;
    let contract = service
        .get_contract(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(contract))
}

pub async fn list_contracts_handler(
    State(service): State<Arc<dyn ContractService>>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, HandlerError> {
    let contracts = service
        .list_contracts(&actor)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(contracts))
}

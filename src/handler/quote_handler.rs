use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use bytes::BytesMut;
use std::sync::Arc;
use tracing::{debug, error, info};
use validator::Validate;

use crate::dto::quote_dto::{
    AttachContractRequest, CreateQuoteRequest, File, SetPriceRequest, StageChange,
    UpdateQuoteStatusRequest,
};
use crate::handler::parse_object_id;
use crate::model::actor::Actor;
use crate::service::quote_service::QuoteService;
use crate::util::error::HandlerError;

/// Public intake endpoint. Multipart with a `json` field holding the
/// request body and any number of `file*` fields for attachments.
pub async fn create_quote_handler(
    State(service): State<Arc<dyn QuoteService>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    info!("[create_quote_handler] Handler called");
    let mut request: Option<CreateQuoteRequest> = None;
    let mut files: Vec<File> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HandlerError::bad_request(format!("Failed to get next field: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        debug!("[create_quote_handler] Processing field: {}", name);
        if name == "json" {
            let data = field.bytes().await.map_err(|e| {
                HandlerError::bad_request(format!("Failed to read json field: {}", e))
            })?;
            let parsed: CreateQuoteRequest = serde_json::from_slice(&data)
                .map_err(|e| HandlerError::bad_request(format!("Invalid JSON: {}", e)))?;
            request = Some(parsed);
        } else if name.starts_with("file") {
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_default();
            let mut buf = BytesMut::new();
            let mut stream = field;
            while let Some(chunk) = stream.chunk().await.map_err(|e| {
                HandlerError::bad_request(format!("Failed to read file chunk: {}", e))
            })? {
                buf.extend_from_slice(&chunk);
            }
            info!(
                "[create_quote_handler] Received file: {} ({} bytes)",
                filename,
                buf.len()
            );
            files.push(File {
                filename,
                content_type,
                size: buf.len(),
                content: buf.to_vec(),
            });
        }
    }

    let request = request.ok_or_else(|| {
        error!("[create_quote_handler] Missing quote JSON data");
        HandlerError::bad_request("Missing quote JSON data")
    })?;
    request
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;

    let created = service
        .register_quote(request, files)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(created))
}

pub async fn list_quotes_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<impl IntoResponse, HandlerError> {
    let page = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let quotes = service
        .list_quotes(&actor, page, limit)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(quotes))
}

pub async fn get_quote_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let quote = service
        .get_quote(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(quote))
}

pub async fn update_quote_status_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<UpdateQuoteStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let updated = service
        .update_quote_status(&actor, id, payload.status)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(updated))
}

pub async fn set_price_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<SetPriceRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let updated = service
        .set_price(&actor, id, payload.price)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(updated))
}

pub async fn attach_contract_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<AttachContractRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let contract_id = parse_object_id(&payload.contract_id, "contract")?;
    let updated = service
        .attach_contract(&actor, id, contract_id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(updated))
}

pub async fn approve_quote_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let approved = service
        .approve(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(approved))
}

pub async fn update_stage_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
    Json(change): Json<StageChange>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let updated = service
        .update_stage(&actor, id, change)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(updated))
}

pub async fn quote_status_handler(
    State(service): State<Arc<dyn QuoteService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let view = service
        .status_view(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(view))
}

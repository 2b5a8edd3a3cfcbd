use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::handler::parse_object_id;
use crate::model::actor::Actor;
use crate::service::project_service::ProjectService;
use crate::util::error::HandlerError;

pub async fn start_project_handler(
    State(service): State<Arc<dyn ProjectService>>,
    Extension(actor): Extension<Actor>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let project = service
        .start_project(&actor, id)
        .await
        .map_err(HandlerError::from)?;
    Ok(Json(project))
}

pub async fn get_project_handler(
    State(service): State<Arc<dyn ProjectService>>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "project")?;
    let project = service.get_project(id).await.map_err(HandlerError::from)?;
    Ok(Json(project))
}

pub async fn list_projects_handler(
    State(service): State<Arc<dyn ProjectService>>,
) -> Result<impl IntoResponse, HandlerError> {
    let projects = service.list_projects().await.map_err(HandlerError::from)?;
    Ok(Json(projects))
}

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handler::project_handler::{
    get_project_handler, list_projects_handler, start_project_handler,
};
use crate::middlewares::auth_middleware::{staff_auth, AuthState};
use crate::service::project_service::ProjectService;

pub fn project_router(service: Arc<dyn ProjectService>, auth_state: Arc<AuthState>) -> Router {
    // The finished-project gallery is public.
    let public = Router::new()
        .route("/projects", get(list_projects_handler))
        .route("/projects/{id}", get(get_project_handler));

    let staff = Router::new()
        .route("/quotes/{id}/project", post(start_project_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, staff_auth));

    public.merge(staff).with_state(service)
}

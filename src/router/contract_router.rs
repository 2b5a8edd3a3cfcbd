use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handler::contract_handler::{
    create_contract_handler, get_contract_handler, list_contracts_handler,
};
use crate::middlewares::auth_middleware::{staff_auth, AuthState};
use crate::service::contract_service::ContractService;

pub fn contract_router(service: Arc<dyn ContractService>, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route(
            "/contracts",
            post(create_contract_handler).get(list_contracts_handler),
        )
        .route("/contracts/{id}", get(get_contract_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, staff_auth))
        .with_state(service)
}

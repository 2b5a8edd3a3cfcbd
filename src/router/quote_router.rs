use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handler::quote_handler::{
    approve_quote_handler, attach_contract_handler, create_quote_handler, get_quote_handler,
    list_quotes_handler, quote_status_handler, set_price_handler, update_quote_status_handler,
    update_stage_handler,
};
use crate::middlewares::auth_middleware::{authenticate, staff_auth, AuthState};
use crate::service::quote_service::QuoteService;

pub fn quote_router(service: Arc<dyn QuoteService>, auth_state: Arc<AuthState>) -> Router {
    // Public intake
    let public = Router::new().route("/quotes", post(create_quote_handler));

    // Customer-reachable routes: the service checks quote ownership.
    let customer = Router::new()
        .route("/quotes/{id}/status", get(quote_status_handler))
        .route("/quotes/{id}/approve", post(approve_quote_handler))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            authenticate,
        ));

    // Staff-only routes
    let staff = Router::new()
        .route("/quotes", get(list_quotes_handler))
        .route("/quotes/{id}", get(get_quote_handler))
        .route("/quotes/{id}/status", put(update_quote_status_handler))
        .route("/quotes/{id}/price", put(set_price_handler))
        .route("/quotes/{id}/contract", put(attach_contract_handler))
        .route("/quotes/{id}/stage", put(update_stage_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, staff_auth));

    public.merge(customer).merge(staff).with_state(service)
}

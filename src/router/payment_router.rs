use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handler::payment_handler::{
    confirm_payment_handler, create_intent_handler, list_payments_handler,
};
use crate::middlewares::auth_middleware::{authenticate, staff_auth, AuthState};
use crate::service::payment_service::PaymentService;

pub fn payment_router(service: Arc<dyn PaymentService>, auth_state: Arc<AuthState>) -> Router {
    // The paying customer (or staff on their behalf) drives the intent
    // lifecycle; ownership is checked in the service.
    let customer = Router::new()
        .route("/quotes/{id}/payment-intent", post(create_intent_handler))
        .route("/quotes/{id}/payment-confirm", post(confirm_payment_handler))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            authenticate,
        ));

    let staff = Router::new()
        .route("/quotes/{id}/payments", get(list_payments_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, staff_auth));

    customer.merge(staff).with_state(service)
}

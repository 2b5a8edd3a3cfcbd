use axum::http::StatusCode;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::model::actor::Actor;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};

pub struct AuthState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

/// Validate the bearer token and attach the resulting [`Actor`] as a
/// request extension. Role checks happen in the service layer.
pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = actor_from_request(&state, &req).ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Like [`authenticate`] but rejects non-staff tokens up front, so staff
/// routers never reach a handler with a customer actor.
pub async fn staff_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = actor_from_request(&state, &req).ok_or(StatusCode::UNAUTHORIZED)?;
    if !actor.is_staff() {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

fn actor_from_request(state: &AuthState, req: &Request<Body>) -> Option<Actor> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())?;
    let token = state.jwt_utils.extract_token_from_header(auth_header).ok()?;
    let claims = state.jwt_utils.validate_access_token(&token).ok()?;
    Some(claims.to_actor())
}

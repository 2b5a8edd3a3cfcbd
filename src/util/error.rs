use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    IllegalState,
    Conflict,
    BadGateway,
    Internal,
    Unauthorized,
    Forbidden,
    BadRequest,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::IllegalState => "IllegalState",
            HandlerErrorKind::Conflict => "Conflict",
            HandlerErrorKind::BadGateway => "BadGateway",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::BadRequest => "BadRequest",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerError {
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: message.into(),
            details: None,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match self.error {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            HandlerErrorKind::IllegalState => StatusCode::UNPROCESSABLE_ENTITY,
            HandlerErrorKind::Conflict => StatusCode::CONFLICT,
            HandlerErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

/// Service-level error taxonomy.
///
/// - `InvalidInput`: bad or missing input, rejected before any write.
/// - `IllegalState`: a precondition on the quote's lifecycle failed
///   (approving without a price, promoting twice, confirming a stale
///   intent). Never silently coerced into a different outcome.
/// - `Conflict`: a concurrent writer won the conditional write; the caller
///   must re-read before retrying.
/// - `External`: a dependency (payment processor, blob store) failed;
///   retryable, no local state was mutated.
#[derive(Debug, Clone)]
pub enum ServiceError {
    NotFound(String),
    InvalidInput(String),
    IllegalState(String),
    Conflict(String),
    External(String),
    Forbidden(String),
    InternalError(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::InvalidInput(msg) => write!(f, "Invalid Input: {}", msg),
            ServiceError::IllegalState(msg) => write!(f, "Illegal State: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::External(msg) => write!(f, "External Dependency: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServiceError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<crate::repository::repository_error::RepositoryError> for ServiceError {
    fn from(err: crate::repository::repository_error::RepositoryError) -> Self {
        use crate::repository::repository_error::RepositoryError;
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::InvalidInput(msg),
            RepositoryError::AlreadyExists(msg) => ServiceError::IllegalState(msg),
            RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
            RepositoryError::DatabaseError(msg) => ServiceError::InternalError(msg),
            RepositoryError::ConnectionError(msg) => ServiceError::InternalError(msg),
            RepositoryError::SerializationError(msg) => ServiceError::InternalError(msg),
            RepositoryError::Generic(e) => ServiceError::InternalError(e.to_string()),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        let (kind, message) = match &err {
            ServiceError::NotFound(m) => (HandlerErrorKind::NotFound, m.clone()),
            ServiceError::InvalidInput(m) => (HandlerErrorKind::Validation, m.clone()),
            ServiceError::IllegalState(m) => (HandlerErrorKind::IllegalState, m.clone()),
            ServiceError::Conflict(m) => (HandlerErrorKind::Conflict, m.clone()),
            ServiceError::External(m) => (HandlerErrorKind::BadGateway, m.clone()),
            ServiceError::Forbidden(m) => (HandlerErrorKind::Forbidden, m.clone()),
            ServiceError::InternalError(m) => (HandlerErrorKind::Internal, m.clone()),
        };
        HandlerError {
            error: kind,
            message,
            details: None,
        }
    }
}

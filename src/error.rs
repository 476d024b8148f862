//! Two error layers: [`ServiceError`] for the service functions and
//! [`AppError`] for the HTTP edge, with the mapping between them.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{AbortError, ApplyError, PlanError},
};

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The session store rejected or could not complete an operation.
    #[error("session store unreachable")]
    Unavailable(#[source] StorageError),
    /// The backend is running without a session store.
    #[error("running without a session store (degraded mode)")]
    Degraded,
    /// Caller lacks the admin token or the token is stale.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The payload cannot be applied as given.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The session is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The addressed session, question, or player does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A driver transition exceeded its time budget.
    #[error("transition timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Errors rendered as HTTP responses at the route edge.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or rejected request payload.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing, stale, or wrong admin token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The session state forbids the operation.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backend cannot reach its session store.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("transition timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => {
                ServiceError::InvalidState("another transition is already planned".into())
            }
            PlanError::InvalidTransition(invalid) => {
                ServiceError::InvalidState(invalid.to_string())
            }
        }
    }
}

impl From<ApplyError> for ServiceError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => {
                ServiceError::InvalidState("no planned transition to apply".into())
            }
            ApplyError::IdMismatch { .. } => {
                ServiceError::InvalidState("a different transition was planned meanwhile".into())
            }
            ApplyError::PhaseMismatch { expected, actual } => ServiceError::InvalidState(format!(
                "session moved from {expected:?} to {actual:?} mid-transition"
            )),
            ApplyError::VersionMismatch { expected, actual } => {
                ServiceError::InvalidState(format!(
                    "session advanced under the transition (expected version {expected}, got {actual})"
                ))
            }
        }
    }
}

impl From<AbortError> for ServiceError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => {
                ServiceError::InvalidState("no planned transition to abort".into())
            }
            AbortError::IdMismatch { .. } => {
                ServiceError::InvalidState("abort does not match the planned transition".into())
            }
        }
    }
}

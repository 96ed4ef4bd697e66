use api_types::{FieldError, error::ErrorResponse};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run_with_listener};

mod accounts;
mod categories;
mod convert;
mod extract;
mod goals;
mod notifications;
mod recurring;
mod server;
mod transactions;

#[derive(Debug)]
pub enum ServerError {
    /// Missing, unknown or expired session.
    Unauthorized,
    BadRequest(String),
    Validation(Vec<FieldError>),
    Engine(EngineError),
    /// Failure outside the engine; the message is logged, never returned.
    Internal(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidCursor(_)
        | EngineError::CurrencyMismatch(_)
        | EngineError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorResponse {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorResponse {
                error: "internal server error".to_string(),
                details: None,
            }
        }
        EngineError::Validation(fields) => validation_body(
            fields
                .into_iter()
                .map(|f| FieldError {
                    field: f.field,
                    message: f.message,
                })
                .collect(),
        ),
        other => ErrorResponse {
            error: other.to_string(),
            details: None,
        },
    }
}

fn validation_body(details: Vec<FieldError>) -> ErrorResponse {
    ErrorResponse {
        error: "Validation failed".to_string(),
        details: Some(details),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    details: None,
                },
            ),
            ServerError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    details: None,
                },
            ),
            ServerError::Validation(details) => (StatusCode::BAD_REQUEST, validation_body(details)),
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal server error".to_string(),
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

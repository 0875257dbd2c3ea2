use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use api_types::ErrorBody;
pub use server::{ServerOptions, ServerState, router, run_with_listener};

mod cajas;
mod convert;
mod movements;
mod receipts;
mod registry;
mod server;
mod uploads;
mod withdrawals;

pub mod types {
    pub use api_types::{ErrorBody, caja, movement, receipt, registry, withdrawal};
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::CaseInUse(_) | EngineError::AlreadyClosed(_) => StatusCode::CONFLICT,
        EngineError::MismatchedCaja(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Storage(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for_engine_error(err: &EngineError) -> &'static str {
    match err {
        EngineError::Validation(_) => "VALIDATION",
        EngineError::KeyNotFound(_) => "NOT_FOUND",
        EngineError::CaseInUse(_) => "MALETIN_EN_USO",
        EngineError::AlreadyClosed(_) => "CAJA_CERRADA",
        EngineError::MismatchedCaja(_) => "MISMATCHED_CAJA",
        EngineError::Storage(_) => "STORAGE",
        EngineError::Database(_) => "INTERNAL",
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Storage(reason) => {
            tracing::error!("storage error: {reason}");
            format!("receipt storage failed: {reason}")
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                code_for_engine_error(&err),
                message_for_engine_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "VALIDATION", err),
        };

        let body = ErrorBody {
            error,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(value: axum::extract::multipart::MultipartError) -> Self {
        Self::Generic(format!("invalid multipart body: {}", value.body_text()))
    }
}

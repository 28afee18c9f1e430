//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::service::PredictError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Model failed to load at startup
    ModelUnavailable(String),

    // Malformed body, or a record the pipeline rejected
    BadRequest(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::ModelUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
            PredictError::Scoring(e) => {
                if e.is_integration_defect() {
                    tracing::error!("Scoring defect: {}", e);
                } else {
                    tracing::warn!("Rejected record: {}", e);
                }
                AppError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        if !err.is_panic() {
            return AppError::InternalError(format!("Task failed: {}", err));
        }

        // A panic while scoring is a pipeline failure like any other
        let payload = err.into_panic();
        let cause = if let Some(msg) = payload.downcast_ref::<&str>() {
            msg.to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };

        tracing::error!("Scoring panicked: {}", cause);
        AppError::BadRequest(format!("scoring failed: {}", cause))
    }
}

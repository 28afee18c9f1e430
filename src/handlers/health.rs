//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::service::ModelStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.service.status();

    Json(HealthResponse {
        status: if model.loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model,
    })
}

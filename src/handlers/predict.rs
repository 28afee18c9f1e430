//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::models::{PredictRequest, PredictResponse};
use crate::{AppResult, AppState};

/// Score one client record
///
/// Without a model every request is answered 503, whatever the body.
/// Estimation is CPU-bound and runs on the blocking pool.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    state.service.ensure_loaded()?;
    let Json(req) = payload?;

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.predict(req.features)).await??;

    Ok(Json(PredictResponse::from_result(&result, state.labels)))
}

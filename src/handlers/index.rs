//! Banner handler

use axum::Json;

use crate::models::BannerResponse;

pub const BANNER: &str = "Credit scoring API online";

/// Liveness banner, answers even when the model is not loaded
pub async fn index() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: BANNER.to_string(),
    })
}

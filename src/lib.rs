//! Credit Scoring Decision Service
//!
//! Serves a binary default-risk classifier over HTTP and turns its
//! probability into a grant/refuse decision.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DECISION SERVICE (Axum)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  POST /predict                                              │
//! │     │                                                       │
//! │     ▼                                                       │
//! │  ┌───────────┐   ┌───────────┐   ┌───────────────────────┐  │
//! │  │ Sanitizer │──▶│  Scorer   │──▶│ Decision Policy       │  │
//! │  │ (denylist)│   │ (layout + │   │ (p > t => REFUSED)    │  │
//! │  └───────────┘   │  ONNX)    │   └───────────────────────┘  │
//! │                  └─────▲─────┘                              │
//! │                        │ Arc<ModelArtifact>, loaded once    │
//! │                  ┌─────┴─────┐                              │
//! │                  │  Loader   │  file or model registry      │
//! │                  └───────────┘                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod scoring;
pub mod service;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};
pub use service::{DecisionService, ModelSlot, PredictError};

use scoring::DecisionLabels;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<DecisionService>,
    pub labels: DecisionLabels,
}

impl AppState {
    pub fn new(service: DecisionService, labels: DecisionLabels) -> Self {
        Self {
            service: Arc::new(service),
            labels,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

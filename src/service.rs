//! Decision Service
//!
//! Composes sanitizer, scorer and decision policy behind `predict`.
//!
//! The model slot is fixed when the service is built, before the router
//! accepts any request. A service built without a model stays unavailable
//! for the lifetime of the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FeatureRecord, ScoreResult};
use crate::scoring::{
    score, DecisionPolicy, FeatureSanitizer, LoadError, ModelArtifact, SchemaMode, ScoringError,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictError {
    #[error("{0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Loaded-model slot
#[derive(Debug, Clone)]
pub enum ModelSlot {
    Unloaded { reason: String },
    Loaded(Arc<ModelArtifact>),
}

impl ModelSlot {
    pub fn from_load(result: Result<ModelArtifact, LoadError>) -> Self {
        match result {
            Ok(artifact) => ModelSlot::Loaded(Arc::new(artifact)),
            Err(e) => ModelSlot::Unloaded { reason: e.to_string() },
        }
    }
}

/// Model status for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub engine: Option<&'static str>,
    pub source: Option<String>,
    pub model_type: Option<String>,
    pub feature_count: Option<usize>,
    pub layout_hash: Option<String>,
    pub checksum: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub trained_on_records: Option<u64>,
    pub unavailable_reason: Option<String>,
    pub threshold: f64,
}

#[derive(Debug)]
pub struct DecisionService {
    slot: ModelSlot,
    sanitizer: FeatureSanitizer,
    policy: DecisionPolicy,
    schema: SchemaMode,
}

impl DecisionService {
    pub fn new(slot: ModelSlot, sanitizer: FeatureSanitizer, policy: DecisionPolicy, schema: SchemaMode) -> Self {
        Self {
            slot,
            sanitizer,
            policy,
            schema,
        }
    }

    /// The loaded artifact, or `ModelUnavailable`
    pub fn ensure_loaded(&self) -> Result<&Arc<ModelArtifact>, PredictError> {
        match &self.slot {
            ModelSlot::Loaded(artifact) => Ok(artifact),
            ModelSlot::Unloaded { .. } => {
                Err(PredictError::ModelUnavailable("The model is not loaded.".to_string()))
            }
        }
    }

    /// Sanitize, score and decide for one client record
    pub fn predict(&self, record: FeatureRecord) -> Result<ScoreResult, PredictError> {
        let artifact = self.ensure_loaded()?;

        let vector = self.sanitizer.sanitize(record);
        let probability = score(artifact, &vector, self.schema)?;
        let decision = self.policy.decide(probability);

        tracing::debug!(probability, ?decision, "Record scored");

        Ok(ScoreResult {
            probability,
            decision,
            threshold: self.policy.threshold(),
        })
    }

    pub fn status(&self) -> ModelStatus {
        let threshold = self.policy.threshold();
        match &self.slot {
            ModelSlot::Loaded(artifact) => ModelStatus {
                loaded: true,
                engine: Some(artifact.estimator().engine()),
                source: Some(artifact.source().to_string()),
                model_type: Some(artifact.metadata().model_type.clone()),
                feature_count: Some(artifact.layout().len()),
                layout_hash: Some(format!("{:08x}", artifact.layout().hash())),
                checksum: artifact.checksum().map(str::to_string),
                loaded_at: Some(artifact.loaded_at()),
                trained_on_records: artifact.metadata().trained_on_records,
                unavailable_reason: None,
                threshold,
            },
            ModelSlot::Unloaded { reason } => ModelStatus {
                loaded: false,
                engine: None,
                source: None,
                model_type: None,
                feature_count: None,
                layout_hash: None,
                checksum: None,
                loaded_at: None,
                trained_on_records: None,
                unavailable_reason: Some(reason.clone()),
                threshold,
            },
        }
    }
}

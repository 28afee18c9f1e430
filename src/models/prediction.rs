//! Prediction request/response models

use serde::{Deserialize, Serialize};

use super::record::FeatureRecord;
use crate::scoring::policy::{Decision, DecisionLabels};

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureRecord,
}

/// Outcome of one scoring request. Recomputed per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    /// Estimated probability of default, in [0, 1]
    pub probability: f64,
    pub decision: Decision,
    pub threshold: f64,
}

/// Wire format of a successful prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub score: f64,
    pub decision: String,
    pub threshold: f64,
}

impl PredictResponse {
    pub fn from_result(result: &ScoreResult, labels: DecisionLabels) -> Self {
        Self {
            score: result.probability,
            decision: labels.label(result.decision).to_string(),
            threshold: result.threshold,
        }
    }
}

/// Banner returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerResponse {
    pub message: String,
}

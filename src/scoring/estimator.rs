//! Estimator - ONNX Runtime Integration
//!
//! The model artifact is opaque to the rest of the service: all it exposes
//! is the probability of the positive (default) class for one row.

use std::fmt;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::layout::{FeatureRow, ModelMetadata, DEFAULT_PROBABILITY_OUTPUT};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EstimatorError(pub String);

// ============================================================================
// ESTIMATOR TRAIT
// ============================================================================

/// Binary classifier capable of probability estimation
///
/// Implementations are shared across concurrent requests and must be safe to
/// call from several threads at once.
pub trait Estimator: Send + Sync + fmt::Debug {
    /// Probability of the positive class for a single-row batch
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, EstimatorError>;

    /// Short runtime name, for status reporting
    fn engine(&self) -> &'static str;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// ONNX Runtime session wrapped as an [`Estimator`]
pub struct OnnxEstimator {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    positive_class_index: usize,
    n_features: usize,
}

impl fmt::Debug for OnnxEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxEstimator")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("positive_class_index", &self.positive_class_index)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl OnnxEstimator {
    /// Build a session from serialized ONNX bytes
    pub fn from_bytes(model_bytes: &[u8], metadata: &ModelMetadata) -> Result<Self, EstimatorError> {
        tracing::debug!("Creating ONNX session ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| EstimatorError(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EstimatorError(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| EstimatorError(format!("Load from memory error: {}", e)))?;

        Self::from_session(session, metadata)
    }

    fn from_session(session: Session, metadata: &ModelMetadata) -> Result<Self, EstimatorError> {
        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        let input_name = match &metadata.input_name {
            Some(name) if input_names.contains(name) => name.clone(),
            Some(name) => {
                return Err(EstimatorError(format!(
                    "Model has no input named '{}' (inputs: {:?})",
                    name, input_names
                )))
            }
            None => input_names
                .first()
                .cloned()
                .ok_or_else(|| EstimatorError("No input defined".to_string()))?,
        };

        let output_name = resolve_output_name(metadata.probability_output.as_deref(), &output_names)?;

        tracing::debug!(
            "ONNX session ready: input '{}', probability output '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            positive_class_index: metadata.positive_class_index,
            n_features: metadata.feature_names.len(),
        })
    }
}

/// Pick the output tensor holding class probabilities
fn resolve_output_name(configured: Option<&str>, outputs: &[String]) -> Result<String, EstimatorError> {
    if let Some(name) = configured {
        return if outputs.iter().any(|o| o == name) {
            Ok(name.to_string())
        } else {
            Err(EstimatorError(format!(
                "Model has no output named '{}' (outputs: {:?})",
                name, outputs
            )))
        };
    }

    if outputs.iter().any(|o| o == DEFAULT_PROBABILITY_OUTPUT) {
        return Ok(DEFAULT_PROBABILITY_OUTPUT.to_string());
    }

    outputs
        .last()
        .cloned()
        .ok_or_else(|| EstimatorError("No output defined".to_string()))
}

/// Positive-class probability from a one-row output
///
/// A single column is read as the probability itself (sigmoid head).
pub(crate) fn positive_probability(data: &[f32], positive_class_index: usize) -> Result<f64, EstimatorError> {
    match data.len() {
        0 => Err(EstimatorError("Empty probability output".to_string())),
        1 => Ok(f64::from(data[0])),
        n => data
            .get(positive_class_index)
            .map(|p| f64::from(*p))
            .ok_or_else(|| {
                EstimatorError(format!(
                    "Positive class index {} out of range for {} classes",
                    positive_class_index, n
                ))
            }),
    }
}

impl Estimator for OnnxEstimator {
    fn predict_proba(&self, row: &FeatureRow) -> Result<f64, EstimatorError> {
        if row.len() != self.n_features {
            return Err(EstimatorError(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let input = Array2::<f32>::from_shape_vec((1, row.len()), row.as_slice().to_vec())
            .map_err(|e| EstimatorError(format!("Array error: {}", e)))?;

        let input_tensor = Tensor::from_array(input)
            .map_err(|e| EstimatorError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| EstimatorError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| EstimatorError(format!("No output '{}'", self.output_name)))?;

        let (_, data) = output.try_extract_tensor::<f32>().map_err(|e| {
            EstimatorError(format!(
                "Output '{}' is not a float tensor (export the classifier without zipmap): {}",
                self.output_name, e
            ))
        })?;

        positive_probability(data, self.positive_class_index)
    }

    fn engine(&self) -> &'static str {
        "onnx"
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

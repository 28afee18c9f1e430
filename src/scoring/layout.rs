//! Feature Layout - Model schema sidecar
//!
//! Every ONNX artifact ships with `<model>.onnx.json` describing the columns
//! it was trained on. The column order in `feature_names` is the order of the
//! model's input tensor.
//!
//! ```json
//! {
//!   "feature_names": ["EXT_SOURCE_1", "EXT_SOURCE_2", "EXT_SOURCE_3"],
//!   "model_type": "lightgbm",
//!   "probability_output": "probabilities",
//!   "positive_class_index": 1
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Output name produced by skl2onnx/onnxmltools classifiers with zipmap disabled
pub const DEFAULT_PROBABILITY_OUTPUT: &str = "probabilities";

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("cannot read model metadata {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid model metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model metadata declares no feature names")]
    NoFeatures,

    #[error("feature '{0}' is declared more than once")]
    DuplicateFeature(String),
}

/// Model metadata as stored in the sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Trained columns in input tensor order
    pub feature_names: Vec<String>,

    #[serde(default = "default_model_type")]
    pub model_type: String,

    /// Output holding class probabilities (`[batch, n_classes]` or `[batch, 1]`)
    #[serde(default)]
    pub probability_output: Option<String>,

    /// Column of the positive (default) class
    #[serde(default = "default_positive_class")]
    pub positive_class_index: usize,

    /// Input tensor name; the first input when unset
    #[serde(default)]
    pub input_name: Option<String>,

    #[serde(default)]
    pub trained_on_records: Option<u64>,
}

fn default_model_type() -> String {
    "classifier".to_string()
}

fn default_positive_class() -> usize {
    1
}

impl ModelMetadata {
    pub fn new<I, S>(feature_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_names: feature_names.into_iter().map(Into::into).collect(),
            model_type: default_model_type(),
            probability_output: None,
            positive_class_index: default_positive_class(),
            input_name: None,
            trained_on_records: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let metadata: Self = serde_json::from_str(json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let json = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.feature_names.is_empty() {
            return Err(MetadataError::NoFeatures);
        }

        let mut seen = HashMap::with_capacity(self.feature_names.len());
        for name in &self.feature_names {
            if seen.insert(name.as_str(), ()).is_some() {
                return Err(MetadataError::DuplicateFeature(name.clone()));
            }
        }

        Ok(())
    }
}

/// Resolved column layout of a loaded model
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    names: Vec<String>,
    index: HashMap<String, usize>,
    hash: u32,
}

impl FeatureLayout {
    pub fn new(metadata: &ModelMetadata) -> Self {
        let names = metadata.feature_names.clone();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let hash = compute_layout_hash(&names);

        Self { names, index, hash }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// CRC32 of the ordered column names
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

fn compute_layout_hash(names: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

/// One model input row, in layout order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<f32>,
}

impl FeatureRow {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

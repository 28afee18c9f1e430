//! Scorer
//!
//! Aligns a sanitized record to the model layout and runs the estimator on
//! it as a single-row batch.

use super::artifact::ModelArtifact;
use super::estimator::EstimatorError;
use super::layout::{FeatureLayout, FeatureRow};
use super::sanitizer::SanitizedFeatureVector;
use crate::models::FeatureValue;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoringError {
    #[error("missing required feature '{0}'")]
    MissingFeature(String),

    #[error("feature '{0}' was not seen at fit time")]
    UnknownFeature(String),

    #[error("could not convert string to float for feature '{name}': '{value}'")]
    NonNumeric { name: String, value: String },

    #[error("estimator failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("estimator returned probability {0} outside [0, 1]")]
    OutOfRange(f64),
}

impl ScoringError {
    /// Model or integration defect rather than a bad record
    pub fn is_integration_defect(&self) -> bool {
        matches!(self, ScoringError::OutOfRange(_) | ScoringError::Estimator(_))
    }
}

/// How to treat columns the model was not trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Reject records carrying unknown columns
    Strict,
    /// Drop unknown columns silently
    Lenient,
}

impl SchemaMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            SchemaMode::Strict
        } else {
            SchemaMode::Lenient
        }
    }
}

fn to_model_value(name: &str, value: &FeatureValue) -> Result<f32, ScoringError> {
    match value {
        FeatureValue::Number(n) => Ok(*n as f32),
        FeatureValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        FeatureValue::Missing => Ok(f32::NAN),
        FeatureValue::Text(s) => s.trim().parse::<f32>().map_err(|_| ScoringError::NonNumeric {
            name: name.to_string(),
            value: s.clone(),
        }),
    }
}

/// Build the model input row in layout order
pub fn align(
    layout: &FeatureLayout,
    vector: &SanitizedFeatureVector,
    mode: SchemaMode,
) -> Result<FeatureRow, ScoringError> {
    if mode == SchemaMode::Strict {
        if let Some(unknown) = vector.names().find(|name| layout.feature_index(name).is_none()) {
            return Err(ScoringError::UnknownFeature(unknown.to_string()));
        }
    }

    let values = layout
        .names()
        .iter()
        .map(|name| {
            let value = vector
                .get(name)
                .ok_or_else(|| ScoringError::MissingFeature(name.clone()))?;
            to_model_value(name, value)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureRow::new(values))
}

/// Probability of default for one sanitized record
pub fn score(
    artifact: &ModelArtifact,
    vector: &SanitizedFeatureVector,
    mode: SchemaMode,
) -> Result<f64, ScoringError> {
    let row = align(artifact.layout(), vector, mode)?;
    let probability = artifact.estimator().predict_proba(&row)?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(ScoringError::OutOfRange(probability));
    }

    Ok(probability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRecord;
    use crate::scoring::estimator::Estimator;
    use crate::scoring::layout::ModelMetadata;
    use crate::scoring::sanitizer::sanitize;
    use std::sync::Arc;

    /// Returns a fixed probability, or the first column when unset
    #[derive(Debug)]
    struct EchoEstimator(Option<f64>);

    impl Estimator for EchoEstimator {
        fn predict_proba(&self, row: &FeatureRow) -> Result<f64, EstimatorError> {
            Ok(self.0.unwrap_or_else(|| f64::from(row.as_slice()[0])))
        }

        fn engine(&self) -> &'static str {
            "echo"
        }
    }

    fn artifact(probability: Option<f64>) -> ModelArtifact {
        ModelArtifact::new(
            Arc::new(EchoEstimator(probability)),
            ModelMetadata::new(["EXT_SOURCE_3", "FLAG_OWN_CAR"]),
            "test",
        )
    }

    fn record(pairs: &[(&str, FeatureValue)]) -> SanitizedFeatureVector {
        sanitize(pairs.iter().cloned().collect::<FeatureRecord>())
    }

    #[test]
    fn test_align_orders_by_layout() {
        let layout = FeatureLayout::new(&ModelMetadata::new(["B", "A"]));
        let vector = record(&[("A", 1.0.into()), ("B", 2.0.into())]);

        let row = align(&layout, &vector, SchemaMode::Strict).unwrap();
        assert_eq!(row.as_slice(), &[2.0, 1.0]);
    }

    #[test]
    fn test_align_converts_values() {
        let layout = FeatureLayout::new(&ModelMetadata::new(["N", "B", "T", "M"]));
        let vector = record(&[
            ("N", 0.25.into()),
            ("B", true.into()),
            ("T", " 3.5 ".into()),
            ("M", FeatureValue::Missing),
        ]);

        let row = align(&layout, &vector, SchemaMode::Strict).unwrap();
        let values = row.as_slice();
        assert_eq!(&values[..3], &[0.25, 1.0, 3.5]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_align_missing_feature() {
        let layout = FeatureLayout::new(&ModelMetadata::new(["A", "B"]));
        let vector = record(&[("A", 1.0.into())]);

        let err = align(&layout, &vector, SchemaMode::Lenient).unwrap_err();
        assert!(matches!(err, ScoringError::MissingFeature(name) if name == "B"));
    }

    #[test]
    fn test_align_unknown_feature() {
        let layout = FeatureLayout::new(&ModelMetadata::new(["A"]));
        let vector = record(&[("A", 1.0.into()), ("EXTRA", 2.0.into())]);

        let err = align(&layout, &vector, SchemaMode::Strict).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownFeature(name) if name == "EXTRA"));

        let row = align(&layout, &vector, SchemaMode::Lenient).unwrap();
        assert_eq!(row.as_slice(), &[1.0]);
    }

    #[test]
    fn test_align_non_numeric_text() {
        let layout = FeatureLayout::new(&ModelMetadata::new(["CODE_GENDER"]));
        let vector = record(&[("CODE_GENDER", "F".into())]);

        let err = align(&layout, &vector, SchemaMode::Strict).unwrap_err();
        assert!(err.to_string().contains("CODE_GENDER"));
        assert!(!err.is_integration_defect());
    }

    #[test]
    fn test_score_in_range() {
        let vector = record(&[("EXT_SOURCE_3", 0.1.into()), ("FLAG_OWN_CAR", false.into())]);
        let p = score(&artifact(Some(0.8)), &vector, SchemaMode::Strict).unwrap();
        assert_eq!(p, 0.8);
    }

    #[test]
    fn test_score_out_of_range() {
        let vector = record(&[("EXT_SOURCE_3", 0.1.into()), ("FLAG_OWN_CAR", false.into())]);

        let err = score(&artifact(Some(1.2)), &vector, SchemaMode::Strict).unwrap_err();
        assert!(matches!(err, ScoringError::OutOfRange(_)));
        assert!(err.is_integration_defect());

        let err = score(&artifact(Some(f64::NAN)), &vector, SchemaMode::Strict).unwrap_err();
        assert!(matches!(err, ScoringError::OutOfRange(_)));
    }

    #[test]
    fn test_score_passes_row_to_estimator() {
        let vector = record(&[("EXT_SOURCE_3", 0.5.into()), ("FLAG_OWN_CAR", true.into())]);
        let p = score(&artifact(None), &vector, SchemaMode::Strict).unwrap();
        assert_eq!(p, 0.5);
    }
}

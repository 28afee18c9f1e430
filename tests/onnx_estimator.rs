//! ONNX Runtime estimator against a real model file
//!
//! `fixtures/logreg.onnx` is a two-feature logistic regression:
//! `p_default = sigmoid(2 * EXT_SOURCE_1 - EXT_SOURCE_2 + 0.5)`.
//! Outputs are `label` (int64 argmax) and `probabilities` (`[1, 2]` float,
//! column 1 = default).

use std::path::PathBuf;
use std::sync::Arc;

use credit_scoring::models::FeatureRecord;
use credit_scoring::scoring::{
    score, sanitize, ArtifactLoader, Decision, DecisionPolicy, FeatureSanitizer, ModelArtifact,
    ModelMetadata, ModelSource, OnnxEstimator, SchemaMode, ScoringError,
};
use credit_scoring::{DecisionService, ModelSlot};

// sigmoid(2.0)
const P_DEFAULT: f64 = 0.880_797_08;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("logreg.onnx")
}

fn applicant() -> FeatureRecord {
    let mut record = FeatureRecord::new();
    record.insert("SK_ID_CURR", 100002i64);
    record.insert("EXT_SOURCE_1", 1.0);
    record.insert("EXT_SOURCE_2", 0.5);
    record
}

fn load_fixture() -> ModelArtifact {
    let (result, report) = ArtifactLoader::new(ModelSource::File { path: fixture() }).load();
    assert!(report.is_loaded(), "fixture failed to load: {:?}", report);
    result.unwrap()
}

#[test]
fn test_loads_and_scores_positive_class() {
    let artifact = load_fixture();
    assert_eq!(artifact.estimator().engine(), "onnx");
    assert_eq!(artifact.layout().len(), 2);

    let probability = score(&artifact, &sanitize(applicant()), SchemaMode::Strict).unwrap();

    assert!((0.0..=1.0).contains(&probability));
    assert!((probability - P_DEFAULT).abs() < 1e-5, "got {}", probability);
}

#[test]
fn test_positive_class_index_selects_column() {
    let bytes = std::fs::read(fixture()).unwrap();
    let mut metadata = ModelMetadata::new(["EXT_SOURCE_1", "EXT_SOURCE_2"]);
    metadata.positive_class_index = 0;

    let estimator = OnnxEstimator::from_bytes(&bytes, &metadata).unwrap();
    let artifact = ModelArtifact::new(Arc::new(estimator), metadata, "fixture");

    let probability = score(&artifact, &sanitize(applicant()), SchemaMode::Strict).unwrap();
    assert!((probability - (1.0 - P_DEFAULT)).abs() < 1e-5, "got {}", probability);
}

#[test]
fn test_non_float_output_is_estimator_error() {
    let bytes = std::fs::read(fixture()).unwrap();
    let mut metadata = ModelMetadata::new(["EXT_SOURCE_1", "EXT_SOURCE_2"]);
    metadata.probability_output = Some("label".to_string());

    let estimator = OnnxEstimator::from_bytes(&bytes, &metadata).unwrap();
    let artifact = ModelArtifact::new(Arc::new(estimator), metadata, "fixture");

    let err = score(&artifact, &sanitize(applicant()), SchemaMode::Strict).unwrap_err();
    assert!(matches!(err, ScoringError::Estimator(_)), "got {:?}", err);
    assert!(err.is_integration_defect());
}

#[test]
fn test_unknown_input_name_rejected() {
    let bytes = std::fs::read(fixture()).unwrap();
    let mut metadata = ModelMetadata::new(["EXT_SOURCE_1", "EXT_SOURCE_2"]);
    metadata.input_name = Some("float_input".to_string());

    assert!(OnnxEstimator::from_bytes(&bytes, &metadata).is_err());
}

#[test]
fn test_service_decides_with_onnx_model() {
    let service = DecisionService::new(
        ModelSlot::Loaded(Arc::new(load_fixture())),
        FeatureSanitizer::default(),
        DecisionPolicy::default(),
        SchemaMode::Strict,
    );

    let refused = service.predict(applicant()).unwrap();
    assert_eq!(refused.decision, Decision::Refused);

    // sigmoid(-0.5)
    let mut record = FeatureRecord::new();
    record.insert("EXT_SOURCE_1", 0.0);
    record.insert("EXT_SOURCE_2", 1.0);
    let granted = service.predict(record).unwrap();
    assert_eq!(granted.decision, Decision::Granted);
    assert!((granted.probability - 0.377_540_67).abs() < 1e-5);
}

//! Artifact Loader
//!
//! Resolves the configured model source, verifies it and builds the
//! estimator. Runs once at startup. A failure here never stops the process:
//! the caller gets a [`LoadReport`] and the service starts without a model.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::artifact::ModelArtifact;
use super::estimator::{Estimator, EstimatorError, OnnxEstimator};
use super::layout::{MetadataError, ModelMetadata};

/// File name of the model inside a registry version directory
pub const MODEL_FILE_NAME: &str = "model.onnx";

/// Registry version alias resolving to the newest version
pub const LATEST_VERSION: &str = "latest";

/// Where the model artifact comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A single `.onnx` file with its sidecar next to it
    File { path: PathBuf },
    /// `<root>/<name>/<version>/model.onnx`
    Registry {
        root: PathBuf,
        name: String,
        version: String,
    },
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::File { path } => write!(f, "{}", path.display()),
            ModelSource::Registry { root, name, version } => {
                write!(f, "{}@{} (registry {})", name, version, root.display())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model not found: {0}")]
    NotFound(String),

    #[error("model registry lookup failed: {0}")]
    Registry(String),

    #[error("cannot read model {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("cannot create estimator: {0}")]
    Estimator(#[from] EstimatorError),
}

/// Sidecar path for a model file (`model.onnx` -> `model.onnx.json`)
pub fn metadata_path(model_path: &Path) -> PathBuf {
    let mut path = model_path.as_os_str().to_owned();
    path.push(".json");
    PathBuf::from(path)
}

/// Hex SHA-256 of the serialized model
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl ModelSource {
    /// Resolve to the concrete model file path
    pub fn resolve(&self) -> Result<PathBuf, LoadError> {
        match self {
            ModelSource::File { path } => {
                if !path.is_file() {
                    return Err(LoadError::NotFound(path.display().to_string()));
                }
                Ok(path.clone())
            }
            ModelSource::Registry { root, name, version } => {
                let model_dir = root.join(name);
                if !model_dir.is_dir() {
                    return Err(LoadError::Registry(format!(
                        "no model named '{}' in {}",
                        name,
                        root.display()
                    )));
                }

                let version = if version == LATEST_VERSION {
                    latest_version(&model_dir)?
                } else {
                    version.clone()
                };

                let path = model_dir.join(&version).join(MODEL_FILE_NAME);
                if !path.is_file() {
                    return Err(LoadError::Registry(format!(
                        "version '{}' of '{}' has no {}",
                        version, name, MODEL_FILE_NAME
                    )));
                }

                tracing::debug!("Registry resolved {}@{} -> {}", name, version, path.display());
                Ok(path)
            }
        }
    }
}

/// Numeric versions sort numerically and rank above non-numeric ones
fn version_key(version: &str) -> (bool, u64, String) {
    match version.trim_start_matches('v').parse::<u64>() {
        Ok(n) => (true, n, version.to_string()),
        Err(_) => (false, 0, version.to_string()),
    }
}

fn latest_version(model_dir: &Path) -> Result<String, LoadError> {
    let entries = std::fs::read_dir(model_dir).map_err(|source| LoadError::Io {
        path: model_dir.display().to_string(),
        source,
    })?;

    entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .max_by_key(|v| version_key(v))
        .ok_or_else(|| LoadError::Registry(format!("no versions under {}", model_dir.display())))
}

// ============================================================================
// LOAD REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        feature_count: usize,
        layout_hash: String,
        checksum: Option<String>,
        elapsed_ms: u64,
    },
    Failed {
        cause: String,
    },
}

/// Structured startup result, consumed by whoever supervises startup
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: String,
    #[serde(flatten)]
    pub outcome: LoadOutcome,
}

impl LoadReport {
    pub fn new(source: &ModelSource, result: &Result<ModelArtifact, LoadError>, elapsed: Duration) -> Self {
        let outcome = match result {
            Ok(artifact) => LoadOutcome::Loaded {
                feature_count: artifact.layout().len(),
                layout_hash: format!("{:08x}", artifact.layout().hash()),
                checksum: artifact.checksum().map(str::to_string),
                elapsed_ms: elapsed.as_millis() as u64,
            },
            Err(e) => LoadOutcome::Failed { cause: e.to_string() },
        };

        Self {
            source: source.to_string(),
            outcome,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded { .. })
    }

    pub fn log(&self) {
        match &self.outcome {
            LoadOutcome::Loaded {
                feature_count,
                layout_hash,
                checksum,
                elapsed_ms,
            } => tracing::info!(
                source = %self.source,
                feature_count,
                layout_hash = %layout_hash,
                checksum = checksum.as_deref().unwrap_or("-"),
                elapsed_ms,
                "Model loaded"
            ),
            LoadOutcome::Failed { cause } => tracing::error!(
                source = %self.source,
                cause = %cause,
                "Model unavailable, serving in degraded mode"
            ),
        }
    }
}

// ============================================================================
// LOADER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    source: ModelSource,
    expected_sha256: Option<String>,
}

impl ArtifactLoader {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            expected_sha256: None,
        }
    }

    /// Refuse artifacts whose SHA-256 differs
    pub fn expect_sha256(mut self, checksum: Option<String>) -> Self {
        self.expected_sha256 = checksum.map(|c| c.trim().to_ascii_lowercase());
        self
    }

    /// Load with ONNX Runtime and report the outcome
    pub fn load(self) -> (Result<ModelArtifact, LoadError>, LoadReport) {
        self.load_with(|bytes, metadata| {
            let estimator = OnnxEstimator::from_bytes(bytes, metadata)?;
            Ok(Arc::new(estimator) as Arc<dyn Estimator>)
        })
    }

    /// Load with a custom estimator constructor
    pub fn load_with<F>(self, build: F) -> (Result<ModelArtifact, LoadError>, LoadReport)
    where
        F: FnOnce(&[u8], &ModelMetadata) -> Result<Arc<dyn Estimator>, EstimatorError>,
    {
        let started = Instant::now();
        let result = self.try_load(build);
        let report = LoadReport::new(&self.source, &result, started.elapsed());
        (result, report)
    }

    fn try_load<F>(&self, build: F) -> Result<ModelArtifact, LoadError>
    where
        F: FnOnce(&[u8], &ModelMetadata) -> Result<Arc<dyn Estimator>, EstimatorError>,
    {
        let model_path = self.source.resolve()?;
        tracing::info!("Loading model from: {}", model_path.display());

        let metadata = ModelMetadata::from_file(&metadata_path(&model_path))?;

        let bytes = std::fs::read(&model_path).map_err(|source| LoadError::Io {
            path: model_path.display().to_string(),
            source,
        })?;

        let checksum = sha256_hex(&bytes);
        if let Some(expected) = &self.expected_sha256 {
            if *expected != checksum {
                return Err(LoadError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual: checksum,
                });
            }
        }

        let estimator = build(&bytes, &metadata)?;

        Ok(ModelArtifact::new(estimator, metadata, model_path.display().to_string()).with_checksum(checksum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::layout::FeatureRow;
    use std::fs;

    #[derive(Debug)]
    struct ConstEstimator;

    impl Estimator for ConstEstimator {
        fn predict_proba(&self, _row: &FeatureRow) -> Result<f64, EstimatorError> {
            Ok(0.3)
        }

        fn engine(&self) -> &'static str {
            "const"
        }
    }

    fn stub(_: &[u8], _: &ModelMetadata) -> Result<Arc<dyn Estimator>, EstimatorError> {
        Ok(Arc::new(ConstEstimator))
    }

    fn write_model(dir: &Path, features: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(MODEL_FILE_NAME);
        fs::write(&path, b"onnx-bytes").unwrap();
        fs::write(metadata_path(&path), format!(r#"{{"feature_names": {}}}"#, features)).unwrap();
        path
    }

    #[test]
    fn test_metadata_path() {
        assert_eq!(metadata_path(Path::new("models/model.onnx")), PathBuf::from("models/model.onnx.json"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = ModelSource::File {
            path: dir.path().join("model.onnx"),
        };

        let (result, report) = ArtifactLoader::new(source).load_with(stub);
        assert!(matches!(result, Err(LoadError::NotFound(_))));
        assert!(!report.is_loaded());
    }

    #[test]
    fn test_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        fs::write(&path, b"onnx-bytes").unwrap();

        let (result, _) = ArtifactLoader::new(ModelSource::File { path }).load_with(stub);
        assert!(matches!(result, Err(LoadError::Metadata(MetadataError::Io { .. }))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), r#"["A", "B"]"#);

        let (result, report) = ArtifactLoader::new(ModelSource::File { path }).load_with(stub);
        let artifact = result.unwrap();

        assert_eq!(artifact.layout().len(), 2);
        assert_eq!(artifact.checksum(), Some(sha256_hex(b"onnx-bytes").as_str()));
        assert!(report.is_loaded());
    }

    #[test]
    fn test_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), r#"["A"]"#);

        let (result, report) = ArtifactLoader::new(ModelSource::File { path })
            .expect_sha256(Some("00".repeat(32)))
            .load_with(stub);

        assert!(matches!(result, Err(LoadError::ChecksumMismatch { .. })));
        assert!(matches!(report.outcome, LoadOutcome::Failed { .. }));
    }

    #[test]
    fn test_checksum_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), r#"["A"]"#);
        let expected = sha256_hex(b"onnx-bytes").to_ascii_uppercase();

        let (result, _) = ArtifactLoader::new(ModelSource::File { path })
            .expect_sha256(Some(expected))
            .load_with(stub);
        assert!(result.is_ok());
    }

    #[test]
    fn test_estimator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(dir.path(), r#"["A"]"#);

        let (result, _) = ArtifactLoader::new(ModelSource::File { path })
            .load_with(|_, _| Err(EstimatorError("corrupt graph".to_string())));
        assert!(matches!(result, Err(LoadError::Estimator(_))));
    }

    #[test]
    fn test_registry_latest() {
        let root = tempfile::tempdir().unwrap();
        write_model(&root.path().join("credit").join("2"), r#"["A"]"#);
        write_model(&root.path().join("credit").join("10"), r#"["A", "B", "C"]"#);
        write_model(&root.path().join("credit").join("staging"), r#"["A", "B"]"#);

        let source = ModelSource::Registry {
            root: root.path().to_path_buf(),
            name: "credit".to_string(),
            version: LATEST_VERSION.to_string(),
        };
        let resolved = source.resolve().unwrap();
        assert!(resolved.ends_with("credit/10/model.onnx"));

        let (result, _) = ArtifactLoader::new(source).load_with(stub);
        assert_eq!(result.unwrap().layout().len(), 3);
    }

    #[test]
    fn test_registry_pinned_version() {
        let root = tempfile::tempdir().unwrap();
        write_model(&root.path().join("credit").join("1"), r#"["A"]"#);

        let pinned = ModelSource::Registry {
            root: root.path().to_path_buf(),
            name: "credit".to_string(),
            version: "1".to_string(),
        };
        assert!(pinned.resolve().is_ok());

        let missing = ModelSource::Registry {
            root: root.path().to_path_buf(),
            name: "credit".to_string(),
            version: "7".to_string(),
        };
        assert!(matches!(missing.resolve(), Err(LoadError::Registry(_))));

        let unknown = ModelSource::Registry {
            root: root.path().to_path_buf(),
            name: "fraud".to_string(),
            version: LATEST_VERSION.to_string(),
        };
        assert!(matches!(unknown.resolve(), Err(LoadError::Registry(_))));
    }

    #[test]
    fn test_version_ordering() {
        assert!(version_key("10") > version_key("9"));
        assert!(version_key("v3") > version_key("2"));
        assert!(version_key("1") > version_key("staging"));
    }
}

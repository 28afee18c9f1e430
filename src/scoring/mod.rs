//! Scoring Module - Decision-serving pipeline
//!
//! - `loader` - resolve and load the model artifact once at startup
//! - `sanitizer` - strip non-feature columns
//! - `layout` / `scorer` - align to the model schema and estimate
//! - `policy` - probability to business decision

pub mod artifact;
pub mod estimator;
pub mod layout;
pub mod loader;
pub mod policy;
pub mod sanitizer;
pub mod scorer;

// Re-export common types
pub use artifact::ModelArtifact;
pub use estimator::{Estimator, EstimatorError, OnnxEstimator};
pub use layout::{FeatureLayout, FeatureRow, MetadataError, ModelMetadata};
pub use loader::{ArtifactLoader, LoadError, LoadOutcome, LoadReport, ModelSource};
pub use policy::{decide, Decision, DecisionLabels, DecisionPolicy, DEFAULT_THRESHOLD};
pub use sanitizer::{sanitize, FeatureSanitizer, SanitizedFeatureVector, DEFAULT_EXCLUDED_FEATURES};
pub use scorer::{align, score, SchemaMode, ScoringError};

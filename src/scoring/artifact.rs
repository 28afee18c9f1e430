//! Loaded model artifact
//!
//! Immutable once built. Shared read-only by every request for the lifetime
//! of the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::estimator::Estimator;
use super::layout::{FeatureLayout, ModelMetadata};

#[derive(Debug, Clone)]
pub struct ModelArtifact {
    estimator: Arc<dyn Estimator>,
    metadata: ModelMetadata,
    layout: FeatureLayout,
    source: String,
    checksum: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(estimator: Arc<dyn Estimator>, metadata: ModelMetadata, source: impl Into<String>) -> Self {
        let layout = FeatureLayout::new(&metadata);
        Self {
            estimator,
            metadata,
            layout,
            source: source.into(),
            checksum: None,
            loaded_at: Utc::now(),
        }
    }

    /// Attach the SHA-256 of the serialized model
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn estimator(&self) -> &dyn Estimator {
        self.estimator.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

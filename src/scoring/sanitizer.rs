//! Feature Sanitizer
//!
//! Strips identifier, label and synthetic index columns from an inbound
//! record. Everything else passes through untouched; checking the record
//! against the model schema is the scorer's job.

use crate::models::{FeatureRecord, FeatureValue};

/// Columns that are never model features
pub const DEFAULT_EXCLUDED_FEATURES: &[&str] = &[
    // Source dataset
    "SK_ID_CURR",   // client id
    "TARGET",       // ground-truth label
    "index",        // leftover DataFrame index
    "Unnamed: 0",   // index written by to_csv()

    // Generic names
    "record_id",
    "label",
    "row_index",
];

/// Record with the denylisted columns removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedFeatureVector(FeatureRecord);

impl SanitizedFeatureVector {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.names()
    }

    pub fn as_record(&self) -> &FeatureRecord {
        &self.0
    }
}

impl From<SanitizedFeatureVector> for FeatureRecord {
    fn from(vector: SanitizedFeatureVector) -> Self {
        vector.0
    }
}

/// Denylist-based sanitizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSanitizer {
    excluded: Vec<String>,
}

impl Default for FeatureSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_FEATURES.iter().copied())
    }
}

impl FeatureSanitizer {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut excluded: Vec<String> = excluded.into_iter().map(Into::into).collect();
        excluded.sort();
        excluded.dedup();
        Self { excluded }
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|e| e == name)
    }

    /// Remove denylisted keys. Missing keys are not an error.
    pub fn sanitize(&self, mut record: FeatureRecord) -> SanitizedFeatureVector {
        for name in &self.excluded {
            if record.remove(name).is_some() {
                tracing::trace!("Dropped non-feature column '{}'", name);
            }
        }
        SanitizedFeatureVector(record)
    }
}

/// Sanitize with the default denylist
pub fn sanitize(record: FeatureRecord) -> SanitizedFeatureVector {
    FeatureSanitizer::default().sanitize(record)
}

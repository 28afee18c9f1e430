//! Decision service HTTP client

use std::time::Duration;

use crate::models::{FeatureRecord, PredictRequest, PredictResponse};
use crate::scoring::FeatureSanitizer;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/predict";

/// Columns the client drops before sending a record
pub const CLIENT_EXCLUDED_FEATURES: &[&str] = &["TARGET", "SK_ID_CURR", "index"];

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot reach the scoring API at {0}")]
    Unreachable(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Strip identifier and label columns from a source row
pub fn prepare_features(record: &FeatureRecord) -> FeatureRecord {
    FeatureSanitizer::new(CLIENT_EXCLUDED_FEATURES.iter().copied())
        .sanitize(record.clone())
        .into()
}

#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::blocking::Client,
    predict_url: String,
}

impl ScoringClient {
    pub fn new(predict_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            predict_url: predict_url.into(),
        })
    }

    pub fn predict(&self, features: FeatureRecord) -> Result<PredictResponse, ClientError> {
        let response = self
            .http
            .post(&self.predict_url)
            .json(&PredictRequest { features })
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClientError::Unreachable(self.predict_url.clone())
                } else {
                    ClientError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_features() {
        let mut record = FeatureRecord::new();
        record.insert("SK_ID_CURR", 100002i64);
        record.insert("TARGET", 1i64);
        record.insert("EXT_SOURCE_3", 0.139);

        let features = prepare_features(&record);
        assert_eq!(features.names().collect::<Vec<_>>(), vec!["EXT_SOURCE_3"]);
    }
}

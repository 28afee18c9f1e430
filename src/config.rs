//! Configuration module

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::scoring::{
    DecisionLabels, DecisionPolicy, FeatureSanitizer, ModelSource, SchemaMode,
    DEFAULT_EXCLUDED_FEATURES, DEFAULT_THRESHOLD,
};
use crate::scoring::loader::LATEST_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Where to load the model from
    pub model_source: ModelSource,

    /// Expected SHA-256 of the model file
    pub model_sha256: Option<String>,

    /// Probability above which credit is refused
    pub threshold: f64,

    /// Literal decision values on the wire
    pub decision_labels: DecisionLabels,

    /// Columns stripped before scoring, in addition to the default denylist
    pub extra_excluded_features: Vec<String>,

    /// Reject records with columns unknown to the model
    pub strict_features: bool,

    pub log_format: LogFormat,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            model_source: ModelSource::File {
                path: PathBuf::from("model.onnx"),
            },
            model_sha256: None,
            threshold: DEFAULT_THRESHOLD,
            decision_labels: DecisionLabels::default(),
            extra_excluded_features: Vec::new(),
            strict_features: true,
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match get("HOST") {
            Some(v) => v.trim().parse::<IpAddr>().map_err(|e| invalid("HOST", &v, e))?,
            None => defaults.host,
        };

        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|e| invalid("PORT", &v, e))?,
            None => defaults.port,
        };

        let model_source = match (get("MODEL_REGISTRY_DIR"), get("MODEL_NAME")) {
            (Some(root), Some(name)) => ModelSource::Registry {
                root: PathBuf::from(root),
                name,
                version: get("MODEL_VERSION").unwrap_or_else(|| LATEST_VERSION.to_string()),
            },
            _ => match get("MODEL_PATH") {
                Some(path) => ModelSource::File { path: PathBuf::from(path) },
                None => defaults.model_source,
            },
        };

        let threshold = match get("DECISION_THRESHOLD") {
            Some(v) => {
                let t: f64 = v.trim().parse().map_err(|e| invalid("DECISION_THRESHOLD", &v, e))?;
                DecisionPolicy::new(t).map_err(|e| invalid("DECISION_THRESHOLD", &v, e))?;
                t
            }
            None => defaults.threshold,
        };

        let decision_labels = match get("DECISION_LABELS") {
            Some(v) => v.parse::<DecisionLabels>().map_err(|e| invalid("DECISION_LABELS", &v, e))?,
            None => defaults.decision_labels,
        };

        let extra_excluded_features = match get("EXCLUDED_FEATURES") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.extra_excluded_features,
        };

        let strict_features = match get("STRICT_FEATURES") {
            Some(v) => parse_bool("STRICT_FEATURES", &v)?,
            None => defaults.strict_features,
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" || v == "text" => LogFormat::Pretty,
            Some(v) => return Err(invalid("LOG_FORMAT", &v, "expected 'pretty' or 'json'")),
            None => defaults.log_format,
        };

        Ok(Self {
            host,
            port,
            model_source,
            model_sha256: get("MODEL_SHA256"),
            threshold,
            decision_labels,
            extra_excluded_features,
            strict_features,
            log_format,
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn policy(&self) -> Result<DecisionPolicy, ConfigError> {
        DecisionPolicy::new(self.threshold)
            .map_err(|e| invalid("DECISION_THRESHOLD", &self.threshold.to_string(), e))
    }

    /// Default denylist plus the configured extra columns
    pub fn sanitizer(&self) -> FeatureSanitizer {
        let extra = self.extra_excluded_features.iter().map(String::as_str);
        FeatureSanitizer::new(DEFAULT_EXCLUDED_FEATURES.iter().copied().chain(extra))
    }

    pub fn schema_mode(&self) -> SchemaMode {
        SchemaMode::from_strict(self.strict_features)
    }
}

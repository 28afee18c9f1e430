//! Operator client
//!
//! Command-line stand-in for the visual dashboard: picks a record from a
//! flat file and asks the decision service for a verdict.

pub mod api;
pub mod records;

pub use api::{prepare_features, ClientError, ScoringClient, DEFAULT_API_URL};
pub use records::{RecordSource, RecordSourceError, DEFAULT_ID_COLUMN};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw single-prediction body
///
/// Kept as an untyped object so each missing or malformed feature can be
/// reported by name instead of as a generic deserialization failure.
pub type PredictRequest = Map<String, Value>;

/// Request to predict several rows in one model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub instances: Vec<Map<String, Value>>,
}

use serde::{Deserialize, Serialize};

/// Response for the predict endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

/// Response for the batch predict endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub predictions: Vec<f64>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub n_features: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub status_code: u16,
}

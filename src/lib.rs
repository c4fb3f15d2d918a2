//! Price Predictor - HTTP inference service for a housing price regression model
//!
//! The model is loaded once at startup and shared read-only by every worker.
//! Requests carry 13 named numeric features which are validated, assembled in
//! a fixed order and passed to the model as a single-row batch.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{FeatureMatrix, FeatureVector, Predictor, ValidationError, FEATURE_NAMES, N_FEATURES};
pub use crate::models::{PredictResponse, ErrorResponse};
pub use crate::services::{PredictionService, PredictionError, LoadError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(FEATURE_NAMES.len(), N_FEATURES);
        assert_eq!(FEATURE_NAMES[0], "CRIM");
    }
}

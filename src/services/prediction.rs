use crate::config::ModelSettings;
use crate::core::{FeatureMatrix, FeatureVector, PredictError, Predictor, ValidationError, N_FEATURES};
use crate::models::{BatchPredictResponse, PredictResponse};
use crate::services::loader::{load_metadata, load_model, LoadError};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while serving a prediction
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Instance {index}: {source}")]
    InvalidInstance {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("No instances provided")]
    EmptyBatch,

    #[error("Model error: {0}")]
    Model(#[from] PredictError),

    #[error("Model returned {actual} predictions for {expected} rows")]
    OutputSize { expected: usize, actual: usize },

    #[error("Model produced a non-finite prediction for row {row}")]
    NonFinite { row: usize },
}

impl PredictionError {
    /// True when the caller sent a bad request, false for server-side failures
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictionError::Validation(_)
                | PredictionError::InvalidInstance { .. }
                | PredictionError::EmptyBatch
        )
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            PredictionError::Validation(e) => Some(e),
            PredictionError::InvalidInstance { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Owns the loaded model and turns request bodies into predictions
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: Arc<dyn Predictor>,
    metadata: Option<Value>,
}

impl PredictionService {
    /// Wrap a model, checking it consumes exactly the schema's features
    pub fn new(model: Arc<dyn Predictor>) -> Result<Self, LoadError> {
        if model.n_features() != N_FEATURES {
            return Err(LoadError::FeatureCount {
                expected: N_FEATURES,
                actual: model.n_features(),
            });
        }
        Ok(Self { model, metadata: None })
    }

    /// Load the model and optional metadata named by the settings
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, LoadError> {
        let model_path = settings.model_path();
        tracing::info!("Loading model from: {}", model_path.display());

        let mut service = Self::new(load_model(&model_path)?)?;

        if let Some(metadata_path) = settings.metadata_path() {
            service.metadata = load_metadata(&metadata_path)?;
        }

        Ok(service)
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn model(&self) -> &dyn Predictor {
        self.model.as_ref()
    }

    /// Validate, vectorize and predict a single request body
    pub fn predict(&self, body: &Map<String, Value>) -> Result<PredictResponse, PredictionError> {
        tracing::debug!("Arg values passed: {:?}", body);

        let vector = FeatureVector::from_json(body)?;
        tracing::debug!("Feature vector: {:?}", vector.as_slice());

        let prediction = self.predict_vector(&vector)?;
        Ok(PredictResponse { prediction })
    }

    pub fn predict_vector(&self, vector: &FeatureVector) -> Result<f64, PredictionError> {
        let output = self.model.predict(&FeatureMatrix::single(vector))?;
        match output.as_slice() {
            [prediction] => {
                ensure_finite(&output)?;
                Ok(*prediction)
            }
            _ => Err(PredictionError::OutputSize {
                expected: 1,
                actual: output.len(),
            }),
        }
    }

    /// Validate every instance, then predict them in one model call
    pub fn predict_batch(
        &self,
        instances: &[Map<String, Value>],
    ) -> Result<BatchPredictResponse, PredictionError> {
        if instances.is_empty() {
            return Err(PredictionError::EmptyBatch);
        }

        let vectors = instances
            .iter()
            .enumerate()
            .map(|(index, body)| {
                FeatureVector::from_json(body)
                    .map_err(|source| PredictionError::InvalidInstance { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch = FeatureMatrix::from_vectors(&vectors);
        tracing::debug!("Predicting batch of {} rows", batch.n_rows());

        let predictions = self.model.predict(&batch)?;
        if predictions.len() != vectors.len() {
            return Err(PredictionError::OutputSize {
                expected: vectors.len(),
                actual: predictions.len(),
            });
        }
        ensure_finite(&predictions)?;

        Ok(BatchPredictResponse { predictions })
    }
}

/// JSON has no representation for NaN or infinity
fn ensure_finite(predictions: &[f64]) -> Result<(), PredictionError> {
    match predictions.iter().position(|p| !p.is_finite()) {
        Some(row) => Err(PredictionError::NonFinite { row }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LinearModel, FEATURE_NAMES};
    use serde_json::json;

    /// Predicts the sum of all features
    fn service() -> PredictionService {
        let model = LinearModel::new(vec![1.0; N_FEATURES], 0.0).unwrap();
        PredictionService::new(Arc::new(model)).unwrap()
    }

    fn body(value: f64) -> Map<String, Value> {
        FEATURE_NAMES
            .iter()
            .map(|name| (name.to_string(), json!(value)))
            .collect()
    }

    /// Returns nothing, regardless of input
    #[derive(Debug)]
    struct SilentModel;

    impl Predictor for SilentModel {
        fn kind(&self) -> &'static str { "silent" }
        fn n_features(&self) -> usize { N_FEATURES }
        fn predict(&self, _batch: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_predict() {
        let response = service().predict(&body(1.0)).unwrap();
        assert_eq!(response.prediction, 13.0);
    }

    #[test]
    fn test_missing_field_is_client_error() {
        let mut b = body(1.0);
        b.remove("RM");

        let err = service().predict(&b).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.validation(), Some(&ValidationError::MissingField("RM")));
    }

    #[test]
    fn test_rejects_model_with_wrong_width() {
        let model = LinearModel::new(vec![1.0; 3], 0.0).unwrap();
        assert!(matches!(
            PredictionService::new(Arc::new(model)),
            Err(LoadError::FeatureCount { expected: 13, actual: 3 })
        ));
    }

    #[test]
    fn test_empty_model_output_is_server_error() {
        let service = PredictionService::new(Arc::new(SilentModel)).unwrap();
        let err = service.predict(&body(1.0)).unwrap_err();
        assert!(!err.is_client_error());
        assert!(matches!(err, PredictionError::OutputSize { expected: 1, actual: 0 }));
    }

    #[test]
    fn test_overflowing_prediction_is_server_error() {
        let mut b = body(1.0);
        b.insert("CHAS".to_string(), json!(1e308));
        b.insert("NOX".to_string(), json!(1e308));

        let err = service().predict(&b).unwrap_err();
        assert!(!err.is_client_error());
        assert!(matches!(err, PredictionError::NonFinite { row: 0 }));
    }

    #[test]
    fn test_predict_batch_reports_non_finite_row() {
        let mut overflow = body(1.0);
        overflow.insert("B".to_string(), json!(1e308));
        overflow.insert("LSTAT".to_string(), json!(1e308));

        let err = service().predict_batch(&[body(1.0), overflow]).unwrap_err();
        assert!(matches!(err, PredictionError::NonFinite { row: 1 }));
    }

    #[test]
    fn test_predict_batch() {
        let response = service().predict_batch(&[body(1.0), body(2.0)]).unwrap();
        assert_eq!(response.predictions, vec![13.0, 26.0]);
    }

    #[test]
    fn test_predict_batch_reports_instance() {
        let mut bad = body(1.0);
        bad.insert("TAX".to_string(), json!("lots"));

        let err = service().predict_batch(&[body(1.0), bad]).unwrap_err();
        match err {
            PredictionError::InvalidInstance { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source.field(), "TAX");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_predict_batch_empty() {
        assert!(matches!(
            service().predict_batch(&[]),
            Err(PredictionError::EmptyBatch)
        ));
    }

    #[test]
    fn test_metadata() {
        let service = service().with_metadata(json!({"version": "1.0"}));
        assert_eq!(service.metadata(), Some(&json!({"version": "1.0"})));
    }
}

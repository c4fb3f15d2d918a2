use crate::core::predictor::{check_shape, FeatureMatrix, ModelError, PredictError, Predictor};
use serde::{Deserialize, Serialize};

/// Ordinary linear regression: `intercept + coefficients · x`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        let model = Self { coefficients, intercept };
        model.validate(model.coefficients.len())?;
        Ok(model)
    }

    /// Check the parameters against the expected feature count
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.coefficients.len() != n_features {
            return Err(ModelError::CoefficientCount {
                expected: n_features,
                actual: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept"));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite("coefficients"));
        }
        Ok(())
    }

    #[inline]
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

impl Predictor for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, batch: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        check_shape(self.n_features(), batch)?;
        Ok(batch.rows().map(|row| self.predict_row(row)).collect())
    }
}

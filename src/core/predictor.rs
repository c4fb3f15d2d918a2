use crate::core::features::FeatureVector;
use thiserror::Error;

/// Errors a model can raise while predicting
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Shape mismatch: model expects {expected} features, batch has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Errors raised when model parameters are structurally unusable
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model has {actual} coefficients but {expected} features")]
    CoefficientCount { expected: usize, actual: usize },

    #[error("Ensemble contains no trees")]
    NoTrees,

    #[error("Tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("Tree {tree} node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfRange { tree: usize, node: usize, feature: usize, n_features: usize },

    #[error("Tree {tree} node {node} points to invalid child {child}")]
    InvalidChild { tree: usize, node: usize, child: usize },

    #[error("Model parameter {0} is not finite")]
    NonFinite(&'static str),
}

/// Row-major batch of feature vectors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Build a matrix from flat row-major data
    ///
    /// Returns `None` when `data` is not a whole number of rows.
    pub fn from_flat(data: Vec<f64>, n_cols: usize) -> Option<Self> {
        if n_cols == 0 || data.len() % n_cols != 0 {
            return None;
        }
        Some(Self { data, n_cols })
    }

    /// Wrap a single vector as a one-row batch
    pub fn single(vector: &FeatureVector) -> Self {
        Self::from_vectors(std::slice::from_ref(vector))
    }

    pub fn from_vectors(vectors: &[FeatureVector]) -> Self {
        let n_cols = crate::core::features::N_FEATURES;
        let mut data = Vec::with_capacity(vectors.len() * n_cols);
        for v in vectors {
            data.extend_from_slice(v.as_slice());
        }
        Self { data, n_cols }
    }

    pub fn n_rows(&self) -> usize {
        self.data.len() / self.n_cols
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_cols)
    }
}

/// A loaded, read-only regression model
///
/// Implementations are shared across all HTTP workers, so they must be
/// immutable after construction.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    /// Short name of the model family, e.g. `"linear"`
    fn kind(&self) -> &'static str;

    /// Number of columns each input row must have
    fn n_features(&self) -> usize;

    /// Predict one value per row
    fn predict(&self, batch: &FeatureMatrix) -> Result<Vec<f64>, PredictError>;
}

/// Reject batches whose width does not match the model
pub(crate) fn check_shape(expected: usize, batch: &FeatureMatrix) -> Result<(), PredictError> {
    if batch.n_cols() != expected {
        return Err(PredictError::ShapeMismatch {
            expected,
            actual: batch.n_cols(),
        });
    }
    Ok(())
}

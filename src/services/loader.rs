use crate::core::{
    Aggregation, LinearModel, ModelError, Predictor, Tree, TreeEnsemble, FEATURE_NAMES, N_FEATURES,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading startup artifacts
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model artifact: {0}")]
    InvalidModel(#[from] ModelError),

    #[error("Model feature names {actual:?} do not match the expected schema")]
    FeatureNames { actual: Vec<String> },

    #[error("Model declares {actual} features, expected {expected}")]
    FeatureCount { expected: usize, actual: usize },
}

/// On-disk model artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear {
        #[serde(default)]
        n_features: Option<usize>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        #[serde(default)]
        n_features: Option<usize>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        trees: Vec<Tree>,
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        #[serde(default)]
        aggregation: Aggregation,
    },
}

fn default_learning_rate() -> f64 { 1.0 }

/// Compare the optional schema declared by an artifact with the service schema
fn check_schema(
    n_features: Option<usize>,
    feature_names: Option<Vec<String>>,
) -> Result<(), LoadError> {
    if let Some(n) = n_features {
        if n != N_FEATURES {
            return Err(LoadError::FeatureCount {
                expected: N_FEATURES,
                actual: n,
            });
        }
    }
    if let Some(names) = feature_names {
        if !names.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied()) {
            return Err(LoadError::FeatureNames { actual: names });
        }
    }
    Ok(())
}

impl ModelArtifact {
    /// Validate the artifact and turn it into a shareable predictor
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>, LoadError> {
        match self {
            ModelArtifact::Linear {
                n_features,
                feature_names,
                coefficients,
                intercept,
            } => {
                check_schema(n_features, feature_names)?;
                let model = LinearModel::new(coefficients, intercept)?;
                model.validate(N_FEATURES)?;
                Ok(Arc::new(model))
            }
            ModelArtifact::TreeEnsemble {
                n_features,
                feature_names,
                trees,
                base_score,
                learning_rate,
                aggregation,
            } => {
                check_schema(n_features, feature_names)?;
                let model =
                    TreeEnsemble::new(trees, base_score, learning_rate, aggregation, N_FEATURES)?;
                Ok(Arc::new(model))
            }
        }
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the model artifact at `path`
pub fn load_model(path: &Path) -> Result<Arc<dyn Predictor>, LoadError> {
    let contents = read(path)?;
    let artifact: ModelArtifact =
        serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let model = artifact.into_predictor()?;
    tracing::info!(
        "Loaded {} model from {} ({} features)",
        model.kind(),
        path.display(),
        model.n_features()
    );
    Ok(model)
}

/// Load the metadata document at `path`
///
/// A missing file is not an error: the service runs without metadata.
pub fn load_metadata(path: &Path) -> Result<Option<Value>, LoadError> {
    if !path.exists() {
        tracing::warn!("Metadata file {} not found, continuing without it", path.display());
        return Ok(None);
    }

    let contents = read(path)?;
    let metadata = serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(metadata))
}

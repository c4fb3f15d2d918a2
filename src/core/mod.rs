// Core prediction exports
pub mod ensemble;
pub mod features;
pub mod linear;
pub mod predictor;

pub use ensemble::{Aggregation, Node, Tree, TreeEnsemble};
pub use features::{parse_feature, FeatureVector, ValidationError, FEATURE_NAMES, N_FEATURES};
pub use linear::LinearModel;
pub use predictor::{FeatureMatrix, ModelError, PredictError, Predictor};

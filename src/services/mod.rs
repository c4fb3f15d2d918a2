// Service exports
pub mod loader;
pub mod prediction;

pub use loader::{load_metadata, load_model, LoadError, ModelArtifact};
pub use prediction::{PredictionError, PredictionService};

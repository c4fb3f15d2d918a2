// Model exports
pub mod requests;
pub mod responses;

pub use requests::{BatchPredictRequest, PredictRequest};
pub use responses::{BatchPredictResponse, ErrorResponse, HealthResponse, PredictResponse};

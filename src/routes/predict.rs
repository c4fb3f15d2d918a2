use actix_web::{web, HttpResponse, Responder};
use crate::models::{BatchPredictRequest, ErrorResponse, HealthResponse, PredictRequest};
use crate::services::{PredictionError, PredictionService};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

/// Configure all prediction-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/metadata", web::get().to(get_metadata))
        .route("/predict", web::post().to(predict))
        .route("/predict/batch", web::post().to(predict_batch));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let model = state.service.model();

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model.kind().to_string(),
        n_features: model.n_features(),
        timestamp: chrono::Utc::now(),
    })
}

/// Model metadata loaded at startup
async fn get_metadata(state: web::Data<AppState>) -> impl Responder {
    match state.service.metadata() {
        Some(metadata) => HttpResponse::Ok().json(metadata),
        None => HttpResponse::NotFound().json(ErrorResponse {
            error: "not_found".to_string(),
            message: "No model metadata loaded".to_string(),
            field: None,
            status_code: 404,
        }),
    }
}

/// Predict endpoint
///
/// POST /predict
///
/// Request body:
/// ```json
/// {
///   "CRIM": 0.1, "ZN": 0, "INDUS": 7, "CHAS": 0, "NOX": 0.5, "RM": 6, "AGE": 65,
///   "DIS": 4, "RAD": 1, "TAX": 300, "PTRATIO": 15, "B": 390, "LSTAT": 5
/// }
/// ```
async fn predict(
    state: web::Data<AppState>,
    req: web::Json<PredictRequest>,
) -> impl Responder {
    let request_id = uuid::Uuid::new_v4();

    match state.service.predict(&req) {
        Ok(response) => {
            tracing::info!(%request_id, "Prediction: {}", response.prediction);
            HttpResponse::Ok().json(response)
        }
        Err(e) => prediction_error(request_id, &e),
    }
}

/// Batch predict endpoint
///
/// POST /predict/batch
///
/// Request body: `{"instances": [{...}, {...}]}` where each instance has the
/// same shape as a `/predict` body.
async fn predict_batch(
    state: web::Data<AppState>,
    req: web::Json<BatchPredictRequest>,
) -> impl Responder {
    let request_id = uuid::Uuid::new_v4();

    match state.service.predict_batch(&req.instances) {
        Ok(response) => {
            tracing::info!(%request_id, "Predicted {} rows", response.predictions.len());
            HttpResponse::Ok().json(response)
        }
        Err(e) => prediction_error(request_id, &e),
    }
}

fn prediction_error(request_id: uuid::Uuid, err: &PredictionError) -> HttpResponse {
    if !err.is_client_error() {
        tracing::error!(%request_id, "Prediction failed: {}", err);
        return HttpResponse::InternalServerError().json(ErrorResponse {
            error: "prediction_failed".to_string(),
            message: err.to_string(),
            field: None,
            status_code: 500,
        });
    }

    tracing::info!(%request_id, "Rejected prediction request: {}", err);

    let (error, field) = match err.validation() {
        Some(v) => (v.code(), Some(v.field().to_string())),
        None => ("invalid_request", None),
    };

    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        field,
        status_code: 400,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationError;

    #[test]
    fn test_missing_field_maps_to_bad_request() {
        let err = PredictionError::Validation(ValidationError::MissingField("LSTAT"));
        let response = prediction_error(uuid::Uuid::new_v4(), &err);
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_model_failure_maps_to_server_error() {
        let err = PredictionError::OutputSize { expected: 1, actual: 0 };
        let response = prediction_error(uuid::Uuid::new_v4(), &err);
        assert_eq!(response.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}

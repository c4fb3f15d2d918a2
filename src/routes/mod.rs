// Route exports
pub mod predict;

use crate::models::ErrorResponse;
use actix_web::{error, web, HttpRequest, HttpResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(predict::configure);
}

/// Turn extractor failures into the same error body the handlers use
///
/// Covers bodies that are not JSON, not an object, or sent without a JSON
/// content type.
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!(path = %req.path(), error = %err, "Rejected request body");

    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        field: None,
        status_code: 400,
    });
    error::InternalError::from_response(err, response).into()
}

/// Shared JSON extractor configuration
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}

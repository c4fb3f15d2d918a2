use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use price_predictor::config::{LoggingSettings, Settings};
use price_predictor::routes::{self, predict::AppState};
use price_predictor::services::PredictionService;
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the configured level applies
    let settings = Settings::load();
    let logging = match &settings {
        Ok(s) => s.logging.clone(),
        Err(_) => LoggingSettings::from_env(),
    };

    // Initialize logging; RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting price predictor service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    // Load the model once; every worker shares it read-only
    let service = PredictionService::from_settings(&settings.model).map_err(|e| {
        error!("Failed to load model: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    info!(
        "Model ready: {} ({} features, metadata {})",
        service.model().kind(),
        service.model().n_features(),
        if service.metadata().is_some() { "loaded" } else { "absent" }
    );

    let app_state = AppState {
        service: Arc::new(service),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

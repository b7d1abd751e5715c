use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use heart_risk::config::Settings;
use heart_risk::core::Predictor;
use heart_risk::routes::{
    self, handle_form_payload_error, handle_json_payload_error, handle_query_payload_error,
    predict::AppState,
};
use heart_risk::services::ArtifactLoader;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

fn startup_error(message: String) -> std::io::Error {
    error!("{}", message);
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the logging section applies
    let settings = Settings::load().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, format!("Configuration error: {}", e))
    })?;

    // Initialize logging, RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match settings.logging.format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.init(),
    }

    info!("Starting heart risk service...");

    // The service must not accept requests without a usable classifier
    let loader = ArtifactLoader::new(settings.model.fetch_timeout())
        .map_err(|e| startup_error(format!("Failed to build artifact loader: {}", e)))?;

    let mut artifact = loader
        .load(&settings.model.location)
        .await
        .map_err(|e| startup_error(format!("Failed to load model artifact from {}: {}", settings.model.location, e)))?;

    if let Some(map) = &settings.model.generation_encoding {
        artifact = artifact
            .with_encoding(map)
            .map_err(|e| startup_error(format!("Invalid configured generation encoding: {}", e)))?;
        info!("Using configured generation encoding");
    }

    let predictor = Predictor::new(artifact.classifier.clone(), artifact.encoding)
        .with_timeout(settings.prediction.timeout())
        .with_max_in_flight(settings.prediction.max_in_flight);

    info!("Predictor initialized: {:?}", predictor);

    let app_state = AppState {
        predictor,
        model: artifact.info.clone(),
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
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::FormConfig::default().error_handler(handle_form_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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

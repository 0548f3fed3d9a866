mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::{MarketPulse, PropertySearch, ZipCentroids};
use crate::routes::AppState;
use crate::services::{JwtValidator, PulseCache, RepliersClient, StorageClient};
use std::sync::Arc;
use tracing::{error, info, warn};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting MLS gateway...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize Repliers client
    let repliers = Arc::new(RepliersClient::new(
        settings.repliers.endpoint.clone(),
        settings.repliers.api_key.clone(),
        settings.repliers.timeout_secs,
    ));

    if !repliers.is_configured() {
        warn!("No Repliers API key configured; search and pulse endpoints will answer 503");
    }

    info!("Repliers client initialized");

    // Load the zip-centroid data asset
    let centroids = match ZipCentroids::from_file(&settings.pulse.zip_centroids_path) {
        Ok(table) => {
            info!("Loaded {} zip centroids from {}", table.len(), settings.pulse.zip_centroids_path);
            Arc::new(table)
        }
        Err(e) => {
            warn!("Failed to load zip centroids ({}), geographic output will be empty", e);
            Arc::new(ZipCentroids::default())
        }
    };

    // Initialize the pulse cache
    let cache = Arc::new(PulseCache::new(256, settings.pulse.cache_ttl_secs));
    info!("Pulse cache initialized (TTL: {}s)", settings.pulse.cache_ttl_secs);

    // Initialize saved-CMA storage when a database is configured
    let storage = match &settings.database.url {
        Some(url) => {
            let max_conn = settings.database.max_connections.unwrap_or(10);
            let min_conn = settings.database.min_connections.unwrap_or(1);

            match StorageClient::new(url, max_conn, min_conn).await {
                Ok(client) => {
                    info!("Storage client initialized (max: {} connections)", max_conn);
                    Some(Arc::new(client))
                }
                Err(e) => {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    panic!("PostgreSQL connection error: {}", e);
                }
            }
        }
        None => {
            warn!("No database configured; saved-CMA endpoints will answer 503");
            None
        }
    };

    // Initialize the core components
    let search = Arc::new(PropertySearch::new(repliers.clone(), settings.search.clone()));
    let pulse = Arc::new(MarketPulse::new(
        repliers.clone(),
        centroids,
        settings.pulse.clone(),
    ));

    info!("Search composer and pulse aggregator initialized");

    let jwt = web::Data::new(JwtValidator::new(&settings.auth.jwt_secret));

    // Build application state
    let app_state = AppState {
        repliers,
        search,
        pulse,
        cache,
        storage,
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
            .app_data(jwt.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
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

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod websocket;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use log::info;
use middleware::logging::RequestLogger;

use crate::config::Config;
use crate::security::analysis::{HttpAnalysisBackend, TransactionAnalyzer};
use crate::security::BiometricsError;
use crate::utils::clock::{Clock, SystemClock};

/// State shared by every worker
pub struct AppState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub analyzer: Arc<TransactionAnalyzer>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BiometricsError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let backend = HttpAnalysisBackend::from_config(&config.analysis)?;
        let analyzer = TransactionAnalyzer::new(Arc::new(backend), clock.clone());

        Ok(AppState {
            config,
            clock,
            analyzer: Arc::new(analyzer),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.session.tick_interval_ms)
    }
}

pub async fn start_api_server(config: Config) -> Result<()> {
    let server_address = format!("{}:{}", config.api.host, config.api.port);
    let workers = config.api.workers;
    let cors_origin = config.api.cors_origin.clone();

    info!("Starting API server on {}", server_address);
    info!("Submitting analyses to {}", config.analysis.endpoint);

    let state = web::Data::new(AppState::new(config)?);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Content-Type"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(RequestLogger::new())
            .app_data(state.clone())
            // Register API routes
            .configure(routes::register_routes)
    })
    .bind(&server_address)
    .with_context(|| format!("Failed to bind {}", server_address))?
    .workers(workers)
    .run()
    .await
    .context("API server terminated with an error")
}

use actix_web::web;
use super::handlers::{assessment, health};

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    // API version prefix - all routes will be under /api/v1
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health_check))
            .route("/merchants", web::get().to(health::list_merchants))
            // Stateless assessment routes
            .route("/risk", web::post().to(assessment::estimate_risk))
            .route("/factors", web::post().to(assessment::evaluate_factors))
            // Live biometric session
            .route("/ws", web::get().to(super::websocket::ws_handler))
    );
}

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::{parse_amount, FactorStatus, MerchantCategory, TransactionContext};
use crate::security::behavioral_biometrics::BiometricSnapshot;
use crate::security::factors::{self, BiometricFactor, FactorId, FactorReport, FactorSummary};
use crate::security::transaction_risk::estimate_risk_for_label;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRequest {
    /// Raw amount text as typed
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub merchant_type: String,
}

#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub risk: u32,
    pub status: FactorStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorsRequest {
    pub snapshot: BiometricSnapshot,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub merchant_type: MerchantCategory,
}

#[derive(Debug, Serialize)]
pub struct FactorsResponse {
    pub factors: Vec<BiometricFactor>,
    pub report: Vec<FactorReport>,
    pub summary: FactorSummary,
}

// Transaction context risk for an amount and merchant.
// Unknown merchant names weigh 1.0.
pub async fn estimate_risk(req: web::Json<RiskRequest>) -> impl Responder {
    let amount = parse_amount(&req.amount).unwrap_or_default();
    let risk = estimate_risk_for_label(amount, &req.merchant_type);

    HttpResponse::Ok().json(RiskResponse {
        risk,
        status: FactorId::TransactionRisk.rule().status(risk as f64),
    })
}

// Evaluate a snapshot captured elsewhere
pub async fn evaluate_factors(req: web::Json<FactorsRequest>) -> impl Responder {
    let context = TransactionContext::from_input(&req.amount, req.merchant_type);
    let grid = factors::evaluate_factors(&req.snapshot, &context);

    HttpResponse::Ok().json(FactorsResponse {
        report: factors::build_report(&grid, &context),
        summary: factors::summarize(&grid),
        factors: grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::register_routes;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_risk_endpoint() {
        let app = test::init_service(App::new().configure(register_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/risk")
            .set_json(serde_json::json!({ "amount": "60,000", "merchantType": "cryptocurrency" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk"], 90);
        assert_eq!(body["status"], "critical");
    }

    #[actix_web::test]
    async fn test_risk_unknown_merchant_and_empty_amount() {
        let app = test::init_service(App::new().configure(register_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/risk")
            .set_json(serde_json::json!({ "amount": "60000", "merchantType": "casino" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk"], 30);
        assert_eq!(body["status"], "warning");

        let req = test::TestRequest::post()
            .uri("/api/v1/risk")
            .set_json(serde_json::json!({ "amount": "" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk"], 0);
        assert_eq!(body["status"], "normal");
    }

    #[actix_web::test]
    async fn test_factors_endpoint() {
        let app = test::init_service(App::new().configure(register_routes)).await;

        let snapshot = serde_json::to_value(BiometricSnapshot::default()).unwrap();
        let req = test::TestRequest::post()
            .uri("/api/v1/factors")
            .set_json(serde_json::json!({
                "snapshot": snapshot,
                "amount": "60000",
                "merchantType": "cryptocurrency"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let grid = body["factors"].as_array().unwrap();
        assert_eq!(grid.len(), 18);
        assert_eq!(grid[6]["id"], "mouse_speed");
        assert_eq!(grid[6]["status"], "critical");
        assert_eq!(body["report"][17]["value"], "₹60000 (Cryptocurrency)");
        assert_eq!(body["report"][17]["status"], "critical");
    }

    #[actix_web::test]
    async fn test_factors_rejects_unknown_merchant() {
        let app = test::init_service(App::new().configure(register_routes)).await;

        let snapshot = serde_json::to_value(BiometricSnapshot::default()).unwrap();
        let req = test::TestRequest::post()
            .uri("/api/v1/factors")
            .set_json(serde_json::json!({
                "snapshot": snapshot,
                "amount": "100",
                "merchantType": "casino"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}

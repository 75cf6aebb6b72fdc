use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::api::AppState;
use crate::models::MerchantCategory;
use crate::utils::timestamp_to_iso;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantInfo {
    pub value: MerchantCategory,
    pub label: &'static str,
    pub risk_weight: f64,
}

// Liveness probe
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp_to_iso(state.clock.now_millis()),
    }))
}

// Merchant catalogue with risk weights
pub async fn list_merchants() -> impl Responder {
    let merchants: Vec<MerchantInfo> = MerchantCategory::ALL
        .iter()
        .map(|category| MerchantInfo {
            value: *category,
            label: category.label(),
            risk_weight: category.risk_weight(),
        })
        .collect();

    HttpResponse::Ok().json(merchants)
}

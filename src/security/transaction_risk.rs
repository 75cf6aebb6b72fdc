use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{MerchantCategory, TransactionContext};

// Amount breakpoints (exclusive lower bound, risk points), highest first
const AMOUNT_BREAKPOINTS: [(Decimal, f64); 4] = [
    (dec!(100000), 50.0),
    (dec!(50000), 30.0),
    (dec!(10000), 15.0),
    (dec!(5000), 5.0),
];

const MAX_RISK: f64 = 100.0;

/// Risk points contributed by the amount alone
pub fn amount_risk(amount: Decimal) -> f64 {
    AMOUNT_BREAKPOINTS
        .iter()
        .find(|(threshold, _)| amount > *threshold)
        .map(|(_, risk)| *risk)
        .unwrap_or(0.0)
}

/// Transaction context risk on a 0-100 scale.
///
/// A missing category weighs 1.0.
pub fn estimate_risk(amount: Decimal, merchant: Option<MerchantCategory>) -> u32 {
    let weight = merchant.map(|m| m.risk_weight()).unwrap_or(1.0);
    let risk = (amount_risk(amount) * weight).min(MAX_RISK);
    risk.round() as u32
}

/// Same as [`estimate_risk`] but keyed by the merchant's wire name
pub fn estimate_risk_for_label(amount: Decimal, merchant: &str) -> u32 {
    estimate_risk(amount, merchant.parse().ok())
}

pub fn context_risk(context: &TransactionContext) -> u32 {
    estimate_risk(context.amount_or_zero(), Some(context.merchant_category))
}

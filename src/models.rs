use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Define core types
pub type Timestamp = u64; // Milliseconds
pub type SessionId = uuid::Uuid;

/// A pointer position in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Merchant category of the transaction being entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantCategory {
    Grocery,
    Restaurant,
    GasStation,
    Entertainment,
    OnlineShopping,
    Jewelry,
    Electronics,
    Travel,
    Cryptocurrency,
    Gambling,
}

impl MerchantCategory {
    pub const ALL: [MerchantCategory; 10] = [
        MerchantCategory::Grocery,
        MerchantCategory::Restaurant,
        MerchantCategory::GasStation,
        MerchantCategory::Entertainment,
        MerchantCategory::OnlineShopping,
        MerchantCategory::Jewelry,
        MerchantCategory::Electronics,
        MerchantCategory::Travel,
        MerchantCategory::Cryptocurrency,
        MerchantCategory::Gambling,
    ];

    /// Wire name, as used in submission payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantCategory::Grocery => "grocery",
            MerchantCategory::Restaurant => "restaurant",
            MerchantCategory::GasStation => "gas_station",
            MerchantCategory::Entertainment => "entertainment",
            MerchantCategory::OnlineShopping => "online_shopping",
            MerchantCategory::Jewelry => "jewelry",
            MerchantCategory::Electronics => "electronics",
            MerchantCategory::Travel => "travel",
            MerchantCategory::Cryptocurrency => "cryptocurrency",
            MerchantCategory::Gambling => "gambling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MerchantCategory::Grocery => "Grocery Store",
            MerchantCategory::Restaurant => "Restaurant",
            MerchantCategory::GasStation => "Gas Station",
            MerchantCategory::Entertainment => "Entertainment",
            MerchantCategory::OnlineShopping => "Online Shopping",
            MerchantCategory::Jewelry => "Jewelry",
            MerchantCategory::Electronics => "Electronics",
            MerchantCategory::Travel => "Travel",
            MerchantCategory::Cryptocurrency => "Cryptocurrency",
            MerchantCategory::Gambling => "Gambling",
        }
    }

    /// Multiplier applied to the amount risk
    pub fn risk_weight(&self) -> f64 {
        match self {
            MerchantCategory::Grocery => 1.0,
            MerchantCategory::Restaurant => 1.0,
            MerchantCategory::GasStation => 1.2,
            MerchantCategory::Entertainment => 1.3,
            MerchantCategory::OnlineShopping => 1.5,
            MerchantCategory::Jewelry => 2.0,
            MerchantCategory::Electronics => 1.8,
            MerchantCategory::Travel => 1.6,
            MerchantCategory::Cryptocurrency => 3.0,
            MerchantCategory::Gambling => 2.5,
        }
    }
}

impl Default for MerchantCategory {
    fn default() -> Self {
        MerchantCategory::Restaurant
    }
}

impl fmt::Display for MerchantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MerchantCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MerchantCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown merchant category: {}", s))
    }
}

/// Transaction parameters entered alongside the behavioral capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionContext {
    /// Parsed amount; `None` while the field is empty or unparsable
    pub amount: Option<Decimal>,
    pub merchant_category: MerchantCategory,
}

impl TransactionContext {
    pub fn new(amount: Option<Decimal>, merchant_category: MerchantCategory) -> Self {
        TransactionContext {
            amount,
            merchant_category,
        }
    }

    /// Build a context from the raw amount text typed by the user
    pub fn from_input(amount_text: &str, merchant_category: MerchantCategory) -> Self {
        TransactionContext {
            amount: parse_amount(amount_text),
            merchant_category,
        }
    }

    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}

/// Parse a free-text amount the way the amount field accepts it.
///
/// Everything but digits and `.` is dropped, then the longest numeric prefix
/// is read (a second decimal point ends the number).
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let filtered: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut seen_point = false;
    let numeric: String = filtered
        .chars()
        .take_while(|c| {
            if *c == '.' {
                if seen_point {
                    return false;
                }
                seen_point = true;
            }
            true
        })
        .collect();

    let numeric = numeric.trim_end_matches('.');
    if numeric.is_empty() || numeric == "." {
        return None;
    }

    let normalized = if numeric.starts_with('.') {
        format!("0{}", numeric)
    } else {
        numeric.to_string()
    };

    Decimal::from_str(&normalized).ok()
}

/// Three-level classification of a factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Normal,
    Warning,
    Critical,
}

impl FactorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorStatus::Normal => "normal",
            FactorStatus::Warning => "warning",
            FactorStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for FactorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of a transaction analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approved,
    Blocked,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => f.write_str("APPROVED"),
            Decision::Blocked => f.write_str("BLOCKED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1250"), Some(dec!(1250)));
        assert_eq!(parse_amount("₹ 1,250.50"), Some(dec!(1250.50)));
        assert_eq!(parse_amount("1.2.3"), Some(dec!(1.2)));
        assert_eq!(parse_amount(".5"), Some(dec!(0.5)));
        assert_eq!(parse_amount("12."), Some(dec!(12)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("."), None);
    }

    #[test]
    fn test_merchant_category_round_trip_names() {
        for category in MerchantCategory::ALL {
            assert_eq!(category.as_str().parse::<MerchantCategory>(), Ok(category));
        }
        assert!("casino".parse::<MerchantCategory>().is_err());
        assert_eq!(MerchantCategory::default(), MerchantCategory::Restaurant);
    }

    #[test]
    fn test_merchant_serde_names() {
        let json = serde_json::to_string(&MerchantCategory::GasStation).unwrap();
        assert_eq!(json, "\"gas_station\"");
        let status = serde_json::to_string(&FactorStatus::Critical).unwrap();
        assert_eq!(status, "\"critical\"");
        let decision = serde_json::to_string(&Decision::Blocked).unwrap();
        assert_eq!(decision, "\"BLOCKED\"");
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}

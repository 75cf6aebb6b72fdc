// src/security/mod.rs
pub mod analysis;
pub mod behavioral_biometrics;
pub mod factors;
pub mod replay;
pub mod statistics;
pub mod transaction_risk;

use thiserror::Error;

pub use analysis::{AnalysisBackend, HttpAnalysisBackend, TransactionAnalyzer};
pub use behavioral_biometrics::{BiometricEngine, BiometricEvent, BiometricSnapshot};
pub use factors::{build_report, evaluate_factors, BiometricFactor, FactorReport};

/// Error types for biometric analysis
#[derive(Error, Debug)]
pub enum BiometricsError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Analysis service unreachable: {0}")]
    Transport(String),

    #[error("Analysis service rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("Failed to decode analysis response: {0}")]
    Decode(String),
}

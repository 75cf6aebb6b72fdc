// Transaction submission
// Builds the analysis payload from a finished capture, submits it to the
// scoring service and substitutes a local decision when the service fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use rand::Rng;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::models::{Decision, MerchantCategory, TransactionContext};
use crate::security::behavioral_biometrics::BiometricSnapshot;
use crate::security::factors::{build_report, evaluate_factors, FactorReport};
use crate::security::BiometricsError;
use crate::utils::clock::Clock;
use crate::utils::timestamp_to_iso;

// Risk above which the local decision blocks the transaction
const BLOCK_RISK_THRESHOLD: u32 = 50;
const REJECTED_CONFIDENCE: u32 = 87;
const UNREACHABLE_BASE_CONFIDENCE: u32 = 85;

/// Client environment reported with a submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Minutes east of UTC
    pub timezone_offset: i32,
    pub locale: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        EnvironmentInfo {
            screen_width: 0,
            screen_height: 0,
            timezone_offset: 0,
            locale: "en-US".to_string(),
        }
    }
}

/// Payload posted to the scoring service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub amount: f64,
    pub merchant_type: MerchantCategory,
    #[serde(flatten)]
    pub biometrics: BiometricSnapshot,
    #[serde(flatten)]
    pub environment: EnvironmentInfo,
    pub timestamp: String,
}

/// Decision returned by the scoring service, or produced locally
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub decision: Decision,
    pub risk_score: u32,
    pub confidence: u32,
    pub is_fraudulent: bool,
    pub processing_time: String,
    pub timestamp: String,
    #[serde(default)]
    pub factors: Vec<FactorReport>,
}

/// Where a decision came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Service,
    /// The service answered with a non-success status
    FallbackRejected,
    /// The service could not be reached or returned an unreadable body
    FallbackUnreachable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub source: DecisionSource,
    #[serde(flatten)]
    pub response: AnalysisResponse,
}

/// Local decision rule: block strictly above the threshold
pub fn fallback_decision(transaction_risk: u32) -> Decision {
    if transaction_risk > BLOCK_RISK_THRESHOLD {
        Decision::Blocked
    } else {
        Decision::Approved
    }
}

/// Source of uniform samples in `[0, 1)` for the unreachable fallback
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Thread-local RNG
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same sample
#[derive(Clone, Copy, Debug)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

// Scoring service interface for dependency injection
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, BiometricsError>;
}

/// Posts submissions to the scoring service over HTTP
pub struct HttpAnalysisBackend {
    client: Client,
    endpoint: String,
}

impl HttpAnalysisBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, BiometricsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BiometricsError::Transport(e.to_string()))?;

        Ok(HttpAnalysisBackend {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, BiometricsError> {
        Self::new(config.endpoint.clone(), Duration::from_millis(config.timeout_ms))
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, BiometricsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| BiometricsError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BiometricsError::Rejected {
                status: status.as_u16(),
            });
        }

        response
            .json::<AnalysisResponse>()
            .await
            .map_err(|e| BiometricsError::Decode(e.to_string()))
    }
}

/// Submits captures and guarantees a decision for every valid submission
pub struct TransactionAnalyzer {
    backend: Arc<dyn AnalysisBackend>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl TransactionAnalyzer {
    pub fn new(backend: Arc<dyn AnalysisBackend>, clock: Arc<dyn Clock>) -> Self {
        TransactionAnalyzer {
            backend,
            clock,
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Assemble the submission payload. Fails unless the amount is positive.
    pub fn build_request(
        &self,
        snapshot: &BiometricSnapshot,
        context: &TransactionContext,
        environment: &EnvironmentInfo,
    ) -> Result<AnalysisRequest, BiometricsError> {
        let amount = context
            .amount
            .filter(|amount| *amount > Decimal::ZERO)
            .ok_or_else(|| {
                BiometricsError::InvalidAmount(
                    context
                        .amount
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "missing".to_string()),
                )
            })?;

        let amount = amount
            .to_f64()
            .ok_or_else(|| BiometricsError::InvalidAmount(amount.to_string()))?;

        Ok(AnalysisRequest {
            amount,
            merchant_type: context.merchant_category,
            biometrics: snapshot.clone(),
            environment: environment.clone(),
            timestamp: timestamp_to_iso(self.clock.now_millis()),
        })
    }

    pub async fn analyze(
        &self,
        snapshot: &BiometricSnapshot,
        context: &TransactionContext,
        environment: &EnvironmentInfo,
    ) -> Result<AnalysisOutcome, BiometricsError> {
        let started = Instant::now();
        let request = self.build_request(snapshot, context, environment)?;

        debug!(
            "Submitting analysis: amount={} merchant={} risk={}",
            request.amount, request.merchant_type, snapshot.transaction_context_risk
        );

        match self.backend.submit(&request).await {
            Ok(response) => {
                info!(
                    "Analysis service decision: {} (risk {})",
                    response.decision, response.risk_score
                );
                Ok(AnalysisOutcome {
                    source: DecisionSource::Service,
                    response,
                })
            }
            Err(BiometricsError::Rejected { status }) => {
                warn!("Analysis service returned status {}, using local decision", status);
                let risk = snapshot.transaction_context_risk;
                let response = self.local_response(
                    risk,
                    risk,
                    REJECTED_CONFIDENCE,
                    snapshot,
                    context,
                    started.elapsed(),
                );
                Ok(AnalysisOutcome {
                    source: DecisionSource::FallbackRejected,
                    response,
                })
            }
            Err(e) => {
                warn!("Analysis service unavailable ({}), using local decision", e);
                let risk = snapshot.transaction_context_risk;
                let risk_score = (risk as f64 * 0.7 + self.random.next_unit() * 30.0).round() as u32;
                let confidence = UNREACHABLE_BASE_CONFIDENCE + (self.random.next_unit() * 10.0).round() as u32;
                let response = self.local_response(
                    risk,
                    risk_score,
                    confidence,
                    snapshot,
                    context,
                    started.elapsed(),
                );
                Ok(AnalysisOutcome {
                    source: DecisionSource::FallbackUnreachable,
                    response,
                })
            }
        }
    }

    fn local_response(
        &self,
        risk: u32,
        risk_score: u32,
        confidence: u32,
        snapshot: &BiometricSnapshot,
        context: &TransactionContext,
        elapsed: Duration,
    ) -> AnalysisResponse {
        let decision = fallback_decision(risk);
        let factors = evaluate_factors(snapshot, context);

        AnalysisResponse {
            decision,
            risk_score,
            confidence,
            is_fraudulent: decision == Decision::Blocked,
            processing_time: format!("{}ms", elapsed.as_millis()),
            timestamp: timestamp_to_iso(self.clock.now_millis()),
            factors: build_report(&factors, context),
        }
    }
}

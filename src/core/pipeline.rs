use crate::core::encoding::GenerationEncoding;
use crate::core::schema::{check_domains, ValidationError};
use crate::models::{FeatureVector, PatientFeatures, PredictionResult, Verdict};
use crate::services::classifier::Classifier;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Default bound on a single classifier invocation
pub const DEFAULT_PREDICTION_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default cap on classifier calls running on the blocking pool
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Errors that can occur while producing a verdict
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Classifier returned {output}, expected 0 or 1")]
    ContractViolation { output: i64 },

    #[error("Classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Prediction worker failed: {0}")]
    Worker(String),

    #[error("{0} classifier calls already in flight")]
    Saturated(usize),
}

/// Turns validated features into a verdict
///
/// # Pipeline Stages
/// 1. Encode features into the fixed-order vector
/// 2. Invoke the classifier once
/// 3. Interpret the binary output
///
/// The classifier is shared read-only; cloning a `Predictor` is cheap.
/// Clones share one in-flight budget.
#[derive(Clone)]
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
    encoding: GenerationEncoding,
    timeout: Duration,
    max_in_flight: usize,
    in_flight: Arc<Semaphore>,
}

impl Predictor {
    pub fn new(classifier: Arc<dyn Classifier>, encoding: GenerationEncoding) -> Self {
        Self {
            classifier,
            encoding,
            timeout: DEFAULT_PREDICTION_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            in_flight: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the in-flight budget; clones made earlier keep the old one
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        self.max_in_flight = max_in_flight;
        self.in_flight = Arc::new(Semaphore::new(max_in_flight));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn encode(&self, features: &PatientFeatures) -> FeatureVector {
        self.encoding.encode(features)
    }

    /// Run the pipeline synchronously
    ///
    /// Out-of-domain features are rejected without touching the classifier.
    /// Outputs other than 0 or 1 are reported, never coerced.
    pub fn predict(&self, features: &PatientFeatures) -> Result<PredictionResult, PredictionError> {
        check_domains(features)?;

        let vector = self.encode(features);
        let output = self.classifier.predict(&vector);

        let verdict = Verdict::from_output(output)
            .ok_or(PredictionError::ContractViolation { output })?;

        Ok(PredictionResult::from(verdict))
    }

    /// Run the pipeline on the blocking pool, bounded by the configured timeout
    ///
    /// On expiry the request fails; the classifier call itself cannot be
    /// interrupted and finishes in the background, still holding its permit.
    /// When every permit is taken the call is rejected without queueing.
    pub async fn predict_with_timeout(
        &self,
        features: PatientFeatures,
    ) -> Result<PredictionResult, PredictionError> {
        let permit = Arc::clone(&self.in_flight)
            .try_acquire_owned()
            .map_err(|_| PredictionError::Saturated(self.max_in_flight))?;

        let predictor = self.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            predictor.predict(&features)
        });

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(PredictionError::Worker(join_error.to_string())),
            Err(_) => Err(PredictionError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("classifier", &self.classifier.kind())
            .field("encoding", &self.encoding)
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

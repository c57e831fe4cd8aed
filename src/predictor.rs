//! Pipeline orchestration
//!
//! This module provides the public API for AgroStress. `StressPredictor`
//! owns the trained classifier and sequences the five pipeline stages
//! exactly once per request: feature engineering → classification → rule
//! validation → severity scoring → explanation synthesis.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::classifier::StressClassifier;
use crate::error::PredictError;
use crate::explain;
use crate::features::FeatureEngineer;
use crate::rules::RuleValidator;
use crate::severity::SeverityScorer;
use crate::types::{ModelInfo, PredictionMetadata, PredictionResult, RawInput};
use crate::DEFAULT_MODEL_SEED;

/// Crop stress predictor.
///
/// The classifier ensemble is trained once at construction and read-only
/// afterwards; every entry point takes `&self`, so a single predictor can
/// serve concurrent callers without synchronization.
pub struct StressPredictor {
    classifier: StressClassifier,
}

impl Default for StressPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl StressPredictor {
    /// Create a predictor with the default model seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_MODEL_SEED)
    }

    /// Create a predictor with a specific model seed. The same seed always
    /// yields the same trained ensemble.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            classifier: StressClassifier::train(seed),
        }
    }

    /// Run the full pipeline for one request, evaluated as of today (UTC).
    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult, PredictError> {
        self.predict_at(input, Utc::now().date_naive())
    }

    /// Run the full pipeline with a pinned evaluation date. Deterministic:
    /// identical input and date always produce an identical result.
    pub fn predict_at(
        &self,
        input: &RawInput,
        as_of: NaiveDate,
    ) -> Result<PredictionResult, PredictError> {
        let features = FeatureEngineer::engineer(input, as_of)?;
        let ml = self.classifier.classify(&features);
        let validated = RuleValidator::validate(&features, ml);
        let (severity, severity_color) =
            SeverityScorer::score(validated.stress, validated.confidence, &features);
        let explanation = explain::explanation(validated.stress, &features);
        let advisory = explain::advisory(validated.stress, severity);

        debug!(
            crop = features.crop.as_str(),
            stress = validated.stress.as_str(),
            severity = severity.as_str(),
            reason = validated.reason.as_str(),
            "prediction complete"
        );

        Ok(PredictionResult {
            stress_type: validated.stress,
            severity,
            severity_color,
            confidence: to_percent(validated.confidence),
            advisory,
            explanation,
            metadata: PredictionMetadata {
                growth_stage: features.growth_stage,
                days_after_sowing: features.days_after_sowing,
                season: features.season.clone(),
                ml_prediction: ml.stress,
                ml_confidence: to_percent(ml.confidence),
                validation_reason: validated.reason,
            },
        })
    }

    /// Predict independently for each input, preserving input order. The
    /// first failing element's error propagates unmodified.
    pub fn batch_predict(
        &self,
        inputs: &[RawInput],
    ) -> Result<Vec<PredictionResult>, PredictError> {
        self.batch_predict_at(inputs, Utc::now().date_naive())
    }

    /// Batch prediction with a pinned evaluation date.
    pub fn batch_predict_at(
        &self,
        inputs: &[RawInput],
        as_of: NaiveDate,
    ) -> Result<Vec<PredictionResult>, PredictError> {
        inputs
            .iter()
            .map(|input| self.predict_at(input, as_of))
            .collect()
    }

    /// Per-feature importance weights of the trained ensemble.
    pub fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        self.classifier.feature_importance()
    }

    /// Classifier metadata for introspection.
    pub fn model_info(&self) -> ModelInfo {
        self.classifier.info()
    }
}

/// Clamp to [0, 1] and report as a percentage with one decimal.
fn to_percent(confidence: f64) -> f64 {
    (confidence.clamp(0.0, 1.0) * 1000.0).round() / 10.0
}

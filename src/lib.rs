//! AgroStress - deterministic crop stress prediction engine
//!
//! AgroStress transforms crop metadata and weather observations into a
//! stress classification with severity, advisory, and explanation through a
//! deterministic pipeline: feature engineering → ensemble classification →
//! rule validation → severity scoring → explanation synthesis.
//!
//! ## Modules
//!
//! - **features**: derived features and growth stage from raw input
//! - **tree** / **classifier**: bagged decision-tree ensemble trained once
//!   on synthetic rule-labeled samples
//! - **rules**: agronomic validation layer over the raw classifier call
//! - **severity** / **explain**: severity scoring and narrative synthesis
//! - **predictor**: the orchestrator sequencing all stages per request

pub mod classifier;
pub mod error;
pub mod explain;
pub mod features;
pub mod predictor;
pub mod rules;
pub mod severity;
pub mod tree;
pub mod types;

pub use error::PredictError;
pub use predictor::StressPredictor;
pub use types::{
    Classification, CropType, FeatureVector, GrowthStage, ModelInfo, PredictionMetadata,
    PredictionResult, RawInput, Severity, SeverityColor, StressType, Validation,
    ValidationReason, WeatherObservation,
};

/// Engine version reported by CLI diagnostics
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default seed for the process-wide classifier ensemble
pub const DEFAULT_MODEL_SEED: u64 = 42;

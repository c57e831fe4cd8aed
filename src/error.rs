//! Error types for AgroStress

use thiserror::Error;

/// Errors surfaced to prediction callers.
///
/// Unrecognized crop, soil, or season values are never errors; they resolve
/// to documented defaults inside the feature engineer. The trained classifier
/// is owned by the predictor from construction, so no uninitialized-model
/// state is representable.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("unparseable sowing date '{0}': expected YYYY-MM-DD or RFC 3339 datetime")]
    InvalidSowingDate(String),
}

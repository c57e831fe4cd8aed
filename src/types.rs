//! Core types for the AgroStress pipeline
//!
//! This module defines the data structures that flow through each stage of
//! the pipeline: raw input, the engineered feature vector, raw and validated
//! classifications, and the packaged prediction result.

use serde::{Deserialize, Serialize};

/// Number of features in the classifier's model row.
pub const N_MODEL_FEATURES: usize = 11;

/// Canonical feature names, in model-row order.
pub const MODEL_FEATURE_NAMES: [&str; N_MODEL_FEATURES] = [
    "days_after_sowing",
    "season_encoded",
    "soil_retention",
    "avg_temp_norm",
    "rainfall_norm",
    "rolling_rainfall_norm",
    "dry_days_norm",
    "temp_deviation_norm",
    "moisture_stress",
    "heat_stress",
    "waterlogging",
];

/// Supported crop, parsed case-insensitively from raw input.
///
/// Unrecognized crops degrade to [`CropType::Unknown`] rather than erroring;
/// unknown crops have no growth-stage table and no critical stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropType {
    Wheat,
    Rice,
    Maize,
    Cotton,
    Unknown,
}

impl CropType {
    /// Case-insensitive parse; anything unrecognized maps to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "wheat" => CropType::Wheat,
            "rice" => CropType::Rice,
            "maize" => CropType::Maize,
            "cotton" => CropType::Cotton,
            _ => CropType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Wheat => "wheat",
            CropType::Rice => "rice",
            CropType::Maize => "maize",
            CropType::Cotton => "cotton",
            CropType::Unknown => "unknown",
        }
    }
}

/// Crop lifecycle phase derived from days after sowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Germination,
    Tillering,
    StemElongation,
    Vegetative,
    Flowering,
    GrainFilling,
    BollDevelopment,
    Maturity,
    /// Fallback once days after sowing exceed every defined range.
    PostMaturity,
    /// Fallback for unrecognized crops.
    Unknown,
}

impl GrowthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::Germination => "germination",
            GrowthStage::Tillering => "tillering",
            GrowthStage::StemElongation => "stem_elongation",
            GrowthStage::Vegetative => "vegetative",
            GrowthStage::Flowering => "flowering",
            GrowthStage::GrainFilling => "grain_filling",
            GrowthStage::BollDevelopment => "boll_development",
            GrowthStage::Maturity => "maturity",
            GrowthStage::PostMaturity => "post_maturity",
            GrowthStage::Unknown => "unknown",
        }
    }
}

/// Stress classification target. Class indices follow the fixed ordering
/// used for tie-breaking: moisture, heat, waterlogging, no stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressType {
    MoistureStress,
    HeatStress,
    Waterlogging,
    NoStress,
}

impl StressType {
    /// All stress types, in class-index order.
    pub const ALL: [StressType; 4] = [
        StressType::MoistureStress,
        StressType::HeatStress,
        StressType::Waterlogging,
        StressType::NoStress,
    ];

    pub fn class_index(&self) -> usize {
        match self {
            StressType::MoistureStress => 0,
            StressType::HeatStress => 1,
            StressType::Waterlogging => 2,
            StressType::NoStress => 3,
        }
    }

    pub fn from_class_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressType::MoistureStress => "moisture_stress",
            StressType::HeatStress => "heat_stress",
            StressType::Waterlogging => "waterlogging",
            StressType::NoStress => "no_stress",
        }
    }
}

/// Discrete severity level for a validated stress call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Display color paired with a severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    Green,
    Yellow,
    Amber,
    Red,
}

impl SeverityColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityColor::Green => "green",
            SeverityColor::Yellow => "yellow",
            SeverityColor::Amber => "amber",
            SeverityColor::Red => "red",
        }
    }
}

/// Tag identifying which validation rule determined the final call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    LowConfidence,
    HighDryPeriod,
    CriticalStage,
    SufficientRainfall,
    Validated,
    ExtremeHeat,
    CriticalStageHeat,
    NormalTemperature,
    HeavyRainfallPoorDrainage,
    GoodDrainage,
    RecentHeavyRain,
    InsufficientRainfall,
    RuleOverrideMoisture,
    RuleOverrideHeat,
    RuleOverrideWaterlogging,
    ValidatedNoStress,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::LowConfidence => "low_confidence",
            ValidationReason::HighDryPeriod => "high_dry_period",
            ValidationReason::CriticalStage => "critical_stage",
            ValidationReason::SufficientRainfall => "sufficient_rainfall",
            ValidationReason::Validated => "validated",
            ValidationReason::ExtremeHeat => "extreme_heat",
            ValidationReason::CriticalStageHeat => "critical_stage_heat",
            ValidationReason::NormalTemperature => "normal_temperature",
            ValidationReason::HeavyRainfallPoorDrainage => "heavy_rainfall_poor_drainage",
            ValidationReason::GoodDrainage => "good_drainage",
            ValidationReason::RecentHeavyRain => "recent_heavy_rain",
            ValidationReason::InsufficientRainfall => "insufficient_rainfall",
            ValidationReason::RuleOverrideMoisture => "rule_override_moisture",
            ValidationReason::RuleOverrideHeat => "rule_override_heat",
            ValidationReason::RuleOverrideWaterlogging => "rule_override_waterlogging",
            ValidationReason::ValidatedNoStress => "validated_no_stress",
        }
    }
}

/// Weather observation accompanying a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Average temperature (°C)
    #[serde(default = "default_avg_temp")]
    pub avg_temp: f64,
    /// Recent rainfall (mm)
    #[serde(default)]
    pub rainfall: f64,
    /// 7-day cumulative rainfall (mm)
    #[serde(default)]
    pub rolling_7day_rainfall: f64,
    /// Number of consecutive dry days
    #[serde(default)]
    pub consecutive_dry_days: u32,
    /// Temperature deviation from seasonal normal (°C)
    #[serde(default)]
    pub temp_deviation_from_normal: f64,
}

fn default_avg_temp() -> f64 {
    25.0
}

impl Default for WeatherObservation {
    fn default() -> Self {
        Self {
            avg_temp: default_avg_temp(),
            rainfall: 0.0,
            rolling_7day_rainfall: 0.0,
            consecutive_dry_days: 0,
            temp_deviation_from_normal: 0.0,
        }
    }
}

/// Raw prediction request, immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    /// Crop name (wheat, rice, maize, cotton); case-insensitive
    pub crop_type: String,
    /// Sowing date, `YYYY-MM-DD` or RFC 3339 datetime
    pub sowing_date: String,
    /// Free-text soil type (clay, loam, sandy, ...)
    pub soil_type: String,
    /// Season name (monsoon/kharif, winter/rabi, summer/zaid)
    pub season: String,
    pub weather: WeatherObservation,
}

/// Engineered features for one prediction request.
///
/// Created once by the feature engineer, consumed read-only by every
/// downstream stage, never persisted.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub crop: CropType,
    /// Lowercased crop label for display in explanations
    pub crop_label: String,
    pub days_after_sowing: u32,
    pub growth_stage: GrowthStage,
    /// Caller's season string, kept verbatim for display and metadata
    pub season: String,
    /// Season code: 0 monsoon/kharif, 1 winter/rabi, 2 summer/zaid
    pub season_encoded: u8,
    /// Caller's soil string, kept verbatim for display
    pub soil_type: String,
    /// Water retention factor in [0.15, 0.45]; 0.30 for unrecognized soils
    pub soil_retention: f64,
    pub avg_temp_norm: f64,
    pub rainfall_norm: f64,
    pub rolling_rainfall_norm: f64,
    pub dry_days_norm: f64,
    pub temp_deviation_norm: f64,
    pub moisture_stress: f64,
    pub heat_stress: f64,
    pub waterlogging: f64,
}

impl FeatureVector {
    /// Numeric row consumed by the classifier, in [`MODEL_FEATURE_NAMES`] order.
    pub fn model_row(&self) -> [f64; N_MODEL_FEATURES] {
        [
            f64::from(self.days_after_sowing),
            f64::from(self.season_encoded),
            self.soil_retention,
            self.avg_temp_norm,
            self.rainfall_norm,
            self.rolling_rainfall_norm,
            self.dry_days_norm,
            self.temp_deviation_norm,
            self.moisture_stress,
            self.heat_stress,
            self.waterlogging,
        ]
    }
}

/// Raw classifier output before rule validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub stress: StressType,
    /// Winning class probability in [0, 1]
    pub confidence: f64,
}

/// Classifier output after the rule layer confirmed, adjusted, or overrode it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    pub stress: StressType,
    /// Final confidence in [0, 1]; zero when a suppression rule fired
    pub confidence: f64,
    pub reason: ValidationReason,
}

/// Diagnostic block accompanying every prediction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub growth_stage: GrowthStage,
    pub days_after_sowing: u32,
    /// Caller's season string, verbatim
    pub season: String,
    /// Raw classifier call before rule validation
    pub ml_prediction: StressType,
    /// Raw classifier confidence as a percentage (0–100, one decimal)
    pub ml_confidence: f64,
    pub validation_reason: ValidationReason,
}

/// Final packaged prediction, the sole artifact returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub stress_type: StressType,
    pub severity: Severity,
    pub severity_color: SeverityColor,
    /// Validated confidence as a percentage (0–100, one decimal)
    pub confidence: f64,
    pub advisory: String,
    pub explanation: String,
    pub metadata: PredictionMetadata,
}

/// Classifier metadata for introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub n_trees: usize,
    pub max_depth: usize,
    pub features: Vec<String>,
    pub stress_types: Vec<String>,
}

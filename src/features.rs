//! Feature engineering
//!
//! This module derives the model-facing feature vector from raw input:
//! - Days after sowing and crop growth stage
//! - Season encoding and soil water retention
//! - Weather features normalized to [0, 1] against fixed domain ranges
//! - Composite stress indicator scores

use chrono::{DateTime, NaiveDate};

use crate::error::PredictError;
use crate::types::{CropType, FeatureVector, GrowthStage, RawInput};

/// Growth stage day ranges (inclusive) per crop. Ranges are contiguous, so
/// only days beyond the final range fall through to post-maturity.
const WHEAT_STAGES: &[(u32, u32, GrowthStage)] = &[
    (0, 21, GrowthStage::Germination),
    (22, 45, GrowthStage::Tillering),
    (46, 75, GrowthStage::StemElongation),
    (76, 105, GrowthStage::Flowering),
    (106, 135, GrowthStage::GrainFilling),
    (136, 150, GrowthStage::Maturity),
];

const RICE_STAGES: &[(u32, u32, GrowthStage)] = &[
    (0, 20, GrowthStage::Germination),
    (21, 40, GrowthStage::Tillering),
    (41, 65, GrowthStage::StemElongation),
    (66, 95, GrowthStage::Flowering),
    (96, 120, GrowthStage::GrainFilling),
    (121, 140, GrowthStage::Maturity),
];

const MAIZE_STAGES: &[(u32, u32, GrowthStage)] = &[
    (0, 15, GrowthStage::Germination),
    (16, 35, GrowthStage::Vegetative),
    (36, 55, GrowthStage::Flowering),
    (56, 85, GrowthStage::GrainFilling),
    (86, 110, GrowthStage::Maturity),
];

const COTTON_STAGES: &[(u32, u32, GrowthStage)] = &[
    (0, 25, GrowthStage::Germination),
    (26, 60, GrowthStage::Vegetative),
    (61, 95, GrowthStage::Flowering),
    (96, 145, GrowthStage::BollDevelopment),
    (146, 180, GrowthStage::Maturity),
];

/// Retention factor for unrecognized soil types.
const DEFAULT_SOIL_RETENTION: f64 = 0.30;

/// Feature engineer: total over categorical inputs, fallible only on an
/// unparseable sowing date.
pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Derive the feature vector for one request, evaluated as of `as_of`.
    pub fn engineer(input: &RawInput, as_of: NaiveDate) -> Result<FeatureVector, PredictError> {
        let crop = CropType::from_name(&input.crop_type);
        let sowing = parse_sowing_date(&input.sowing_date)?;
        let days_after_sowing = days_between(sowing, as_of);
        let growth_stage = growth_stage_for(crop, days_after_sowing);
        let season_encoded = encode_season(&input.season);
        let soil_retention = soil_retention_factor(&input.soil_type);

        let weather = &input.weather;
        let avg_temp_norm = ((weather.avg_temp - 15.0) / 30.0).clamp(0.0, 1.0);
        let rainfall_norm = (weather.rainfall / 100.0).clamp(0.0, 1.0);
        let rolling_rainfall_norm = (weather.rolling_7day_rainfall / 200.0).clamp(0.0, 1.0);
        let dry_days_norm = (f64::from(weather.consecutive_dry_days) / 14.0).clamp(0.0, 1.0);
        let temp_deviation_norm =
            ((weather.temp_deviation_from_normal + 10.0) / 20.0).clamp(0.0, 1.0);

        Ok(FeatureVector {
            crop,
            crop_label: input.crop_type.to_ascii_lowercase(),
            days_after_sowing,
            growth_stage,
            season: input.season.clone(),
            season_encoded,
            soil_type: input.soil_type.clone(),
            soil_retention,
            avg_temp_norm,
            rainfall_norm,
            rolling_rainfall_norm,
            dry_days_norm,
            temp_deviation_norm,
            moisture_stress: moisture_indicator(dry_days_norm, rolling_rainfall_norm, soil_retention),
            heat_stress: heat_indicator(avg_temp_norm, temp_deviation_norm),
            waterlogging: waterlogging_indicator(rainfall_norm, rolling_rainfall_norm, soil_retention),
        })
    }
}

/// Parse a sowing date from `YYYY-MM-DD` or an RFC 3339 datetime.
pub fn parse_sowing_date(raw: &str) -> Result<NaiveDate, PredictError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.date_naive());
    }
    Err(PredictError::InvalidSowingDate(raw.to_string()))
}

/// Whole days from sowing to the evaluation date, clamped at zero for
/// sowing dates in the future.
fn days_between(sowing: NaiveDate, as_of: NaiveDate) -> u32 {
    (as_of - sowing).num_days().max(0) as u32
}

/// Growth stage lookup: first matching inclusive range wins; days beyond
/// every range are post-maturity; unrecognized crops have no table.
pub fn growth_stage_for(crop: CropType, days_after_sowing: u32) -> GrowthStage {
    let table = match crop {
        CropType::Wheat => WHEAT_STAGES,
        CropType::Rice => RICE_STAGES,
        CropType::Maize => MAIZE_STAGES,
        CropType::Cotton => COTTON_STAGES,
        CropType::Unknown => return GrowthStage::Unknown,
    };

    for &(min_days, max_days, stage) in table {
        if (min_days..=max_days).contains(&days_after_sowing) {
            return stage;
        }
    }

    GrowthStage::PostMaturity
}

/// Encode a season name to its numeric code; unrecognized seasons encode to
/// monsoon's code (0) by design.
pub fn encode_season(season: &str) -> u8 {
    match season.to_ascii_lowercase().as_str() {
        "monsoon" | "kharif" => 0,
        "winter" | "rabi" => 1,
        "summer" | "zaid" => 2,
        _ => 0,
    }
}

/// Water retention factor for a free-text soil type. Lookup is
/// case-insensitive with spaces normalized to underscores.
pub fn soil_retention_factor(soil_type: &str) -> f64 {
    match soil_type.to_ascii_lowercase().replace(' ', "_").as_str() {
        "clay" => 0.45,
        "clay_loam" => 0.40,
        "loam" => 0.35,
        "sandy_loam" => 0.25,
        "sandy" => 0.15,
        "silt" => 0.38,
        "silt_loam" => 0.35,
        _ => DEFAULT_SOIL_RETENTION,
    }
}

/// Moisture stress: dry spell plus rainfall deficit plus low soil retention.
fn moisture_indicator(dry_days_norm: f64, rolling_rainfall_norm: f64, soil_retention: f64) -> f64 {
    let rainfall_deficit = 1.0 - rolling_rainfall_norm;
    let soil_deficit = 1.0 - soil_retention;
    (dry_days_norm * 0.4 + rainfall_deficit * 0.4 + soil_deficit * 0.2).clamp(0.0, 1.0)
}

/// Heat stress: absolute temperature level plus deviation from normal.
fn heat_indicator(avg_temp_norm: f64, temp_deviation_norm: f64) -> f64 {
    (avg_temp_norm * 0.6 + temp_deviation_norm * 0.4).clamp(0.0, 1.0)
}

/// Waterlogging: recent and rolling rainfall plus retention (clay drains poorly).
fn waterlogging_indicator(rainfall_norm: f64, rolling_rainfall_norm: f64, soil_retention: f64) -> f64 {
    (rainfall_norm * 0.3 + rolling_rainfall_norm * 0.5 + soil_retention * 0.2).clamp(0.0, 1.0)
}

//! Rule validation
//!
//! Agronomic rule layer over the raw classifier call. Each stress type has
//! an ordered chain of rules evaluated first-match-wins; a rule can confirm
//! the call with raised confidence, suppress it to no-stress, or leave it
//! untouched. A global confidence gate discards weak classifier calls before
//! any chain runs.

use tracing::debug;

use crate::types::{
    Classification, CropType, FeatureVector, GrowthStage, StressType, Validation, ValidationReason,
};

/// Confidence floor below which any classifier call is discarded.
pub const CONFIDENCE_GATE: f64 = 0.45;

/// Indicator level above which a no-stress call is overridden.
const OVERRIDE_THRESHOLD: f64 = 0.8;

type Rule = fn(&FeatureVector, f64) -> Option<Validation>;

/// Moisture chain: confirmation, critical-stage amplification, suppression.
const MOISTURE_RULES: &[Rule] = &[high_dry_period, moisture_critical_stage, sufficient_rainfall];

/// Heat chain: confirmation, critical-stage amplification, suppression.
const HEAT_RULES: &[Rule] = &[extreme_heat, heat_critical_stage, normal_temperature];

/// Waterlogging chain: confirmation, drainage suppression, recent-rain
/// amplification, dry suppression.
const WATERLOGGING_RULES: &[Rule] = &[
    heavy_rainfall_poor_drainage,
    good_drainage,
    recent_heavy_rain,
    insufficient_rainfall,
];

/// Rule validator: total over all inputs, no failure path.
pub struct RuleValidator;

impl RuleValidator {
    /// Confirm, adjust, or override a raw classifier call.
    pub fn validate(features: &FeatureVector, ml: Classification) -> Validation {
        if ml.confidence < CONFIDENCE_GATE {
            return Validation {
                stress: StressType::NoStress,
                confidence: 0.0,
                reason: ValidationReason::LowConfidence,
            };
        }

        let validation = match ml.stress {
            StressType::MoistureStress => run_chain(MOISTURE_RULES, features, ml),
            StressType::HeatStress => run_chain(HEAT_RULES, features, ml),
            StressType::Waterlogging => run_chain(WATERLOGGING_RULES, features, ml),
            StressType::NoStress => validate_no_stress(features, ml.confidence),
        };

        debug!(
            ml_stress = ml.stress.as_str(),
            final_stress = validation.stress.as_str(),
            reason = validation.reason.as_str(),
            "rule validation"
        );

        validation
    }
}

/// Evaluate a chain in order; fall through to an unchanged confirmation.
fn run_chain(rules: &[Rule], features: &FeatureVector, ml: Classification) -> Validation {
    for rule in rules {
        if let Some(validation) = rule(features, ml.confidence) {
            return validation;
        }
    }
    Validation {
        stress: ml.stress,
        confidence: ml.confidence,
        reason: ValidationReason::Validated,
    }
}

/// Crop-specific stages where stress rules amplify confidence.
fn critical_stages(crop: CropType) -> &'static [GrowthStage] {
    match crop {
        CropType::Wheat | CropType::Rice | CropType::Maize => {
            &[GrowthStage::Flowering, GrowthStage::GrainFilling]
        }
        CropType::Cotton => &[GrowthStage::Flowering, GrowthStage::BollDevelopment],
        CropType::Unknown => &[],
    }
}

fn in_critical_stage(features: &FeatureVector) -> bool {
    critical_stages(features.crop).contains(&features.growth_stage)
}

fn high_dry_period(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (features.dry_days_norm > 0.7
        && features.rolling_rainfall_norm < 0.2
        && features.moisture_stress > 0.6)
        .then_some(Validation {
            stress: StressType::MoistureStress,
            confidence: confidence.max(0.85),
            reason: ValidationReason::HighDryPeriod,
        })
}

fn moisture_critical_stage(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (in_critical_stage(features) && features.moisture_stress > 0.5).then_some(Validation {
        stress: StressType::MoistureStress,
        confidence: (confidence * 1.2).min(0.95),
        reason: ValidationReason::CriticalStage,
    })
}

fn sufficient_rainfall(features: &FeatureVector, _confidence: f64) -> Option<Validation> {
    (features.rainfall_norm > 0.5 && features.dry_days_norm < 0.3).then_some(Validation {
        stress: StressType::NoStress,
        confidence: 0.0,
        reason: ValidationReason::SufficientRainfall,
    })
}

fn extreme_heat(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (features.avg_temp_norm > 0.8 && features.temp_deviation_norm > 0.7).then_some(Validation {
        stress: StressType::HeatStress,
        confidence: confidence.max(0.85),
        reason: ValidationReason::ExtremeHeat,
    })
}

fn heat_critical_stage(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (in_critical_stage(features) && features.heat_stress > 0.6).then_some(Validation {
        stress: StressType::HeatStress,
        confidence: (confidence * 1.15).min(0.95),
        reason: ValidationReason::CriticalStageHeat,
    })
}

fn normal_temperature(features: &FeatureVector, _confidence: f64) -> Option<Validation> {
    (features.avg_temp_norm < 0.5 && features.temp_deviation_norm < 0.4).then_some(Validation {
        stress: StressType::NoStress,
        confidence: 0.0,
        reason: ValidationReason::NormalTemperature,
    })
}

fn heavy_rainfall_poor_drainage(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (features.rolling_rainfall_norm > 0.7 && features.soil_retention > 0.35).then_some(Validation {
        stress: StressType::Waterlogging,
        confidence: confidence.max(0.80),
        reason: ValidationReason::HeavyRainfallPoorDrainage,
    })
}

fn good_drainage(features: &FeatureVector, _confidence: f64) -> Option<Validation> {
    (features.soil_retention < 0.20).then_some(Validation {
        stress: StressType::NoStress,
        confidence: 0.0,
        reason: ValidationReason::GoodDrainage,
    })
}

fn recent_heavy_rain(features: &FeatureVector, confidence: f64) -> Option<Validation> {
    (features.rainfall_norm > 0.8 && features.rolling_rainfall_norm > 0.6).then_some(Validation {
        stress: StressType::Waterlogging,
        confidence: (confidence * 1.1).min(0.90),
        reason: ValidationReason::RecentHeavyRain,
    })
}

fn insufficient_rainfall(features: &FeatureVector, _confidence: f64) -> Option<Validation> {
    (features.rolling_rainfall_norm < 0.3).then_some(Validation {
        stress: StressType::NoStress,
        confidence: 0.0,
        reason: ValidationReason::InsufficientRainfall,
    })
}

/// The classifier saw no stress, but a critically elevated indicator still
/// overrides it. Checked in fixed order: moisture, heat, waterlogging.
fn validate_no_stress(features: &FeatureVector, confidence: f64) -> Validation {
    if features.moisture_stress > OVERRIDE_THRESHOLD {
        return Validation {
            stress: StressType::MoistureStress,
            confidence: 0.75,
            reason: ValidationReason::RuleOverrideMoisture,
        };
    }
    if features.heat_stress > OVERRIDE_THRESHOLD {
        return Validation {
            stress: StressType::HeatStress,
            confidence: 0.75,
            reason: ValidationReason::RuleOverrideHeat,
        };
    }
    if features.waterlogging > OVERRIDE_THRESHOLD {
        return Validation {
            stress: StressType::Waterlogging,
            confidence: 0.75,
            reason: ValidationReason::RuleOverrideWaterlogging,
        };
    }
    Validation {
        stress: StressType::NoStress,
        confidence,
        reason: ValidationReason::ValidatedNoStress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    /// Neutral features: nothing triggers any rule.
    fn base_features() -> FeatureVector {
        FeatureVector {
            crop: CropType::Wheat,
            crop_label: "wheat".to_string(),
            days_after_sowing: 50,
            growth_stage: GrowthStage::StemElongation,
            season: "winter".to_string(),
            season_encoded: 1,
            soil_type: "loam".to_string(),
            soil_retention: 0.35,
            avg_temp_norm: 0.6,
            rainfall_norm: 0.4,
            rolling_rainfall_norm: 0.4,
            dry_days_norm: 0.4,
            temp_deviation_norm: 0.5,
            moisture_stress: 0.4,
            heat_stress: 0.4,
            waterlogging: 0.4,
        }
    }

    fn ml(stress: StressType, confidence: f64) -> Classification {
        Classification { stress, confidence }
    }

    #[test]
    fn low_confidence_gate_overrides_everything() {
        let mut features = base_features();
        // Even with screaming indicators, a weak call is discarded.
        features.dry_days_norm = 1.0;
        features.moisture_stress = 1.0;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.44));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_abs_diff_eq!(validation.confidence, 0.0);
        assert_eq!(validation.reason, ValidationReason::LowConfidence);
    }

    #[test]
    fn confidence_gate_is_inclusive_at_threshold() {
        let validation = RuleValidator::validate(&base_features(), ml(StressType::MoistureStress, 0.45));
        assert_ne!(validation.reason, ValidationReason::LowConfidence);
    }

    #[test]
    fn high_dry_period_raises_confidence_floor() {
        let mut features = base_features();
        features.dry_days_norm = 0.75;
        features.rolling_rainfall_norm = 0.1;
        features.moisture_stress = 0.7;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.5));
        assert_eq!(validation.reason, ValidationReason::HighDryPeriod);
        assert_abs_diff_eq!(validation.confidence, 0.85);

        // An already-stronger call keeps its own confidence.
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.9));
        assert_abs_diff_eq!(validation.confidence, 0.9);
    }

    #[test]
    fn moisture_critical_stage_amplifies() {
        let mut features = base_features();
        features.growth_stage = GrowthStage::Flowering;
        features.moisture_stress = 0.6;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.5));
        assert_eq!(validation.reason, ValidationReason::CriticalStage);
        assert_abs_diff_eq!(validation.confidence, 0.6, epsilon = 1e-9);

        // Amplification is capped.
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.9));
        assert_abs_diff_eq!(validation.confidence, 0.95);
    }

    #[test]
    fn sufficient_rainfall_suppresses_moisture_call() {
        // Fresh downpour with a dry week behind it: the recent-rainfall
        // reading fires even though the rolling total stays low.
        let mut features = base_features();
        features.rainfall_norm = 0.6;
        features.rolling_rainfall_norm = 0.15;
        features.dry_days_norm = 0.1;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.8));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_abs_diff_eq!(validation.confidence, 0.0);
        assert_eq!(validation.reason, ValidationReason::SufficientRainfall);
    }

    #[test]
    fn moisture_chain_precedence_first_match_wins() {
        // Conditions for both high_dry_period and critical_stage hold;
        // the earlier rule must fire.
        let mut features = base_features();
        features.dry_days_norm = 0.8;
        features.rolling_rainfall_norm = 0.1;
        features.moisture_stress = 0.7;
        features.growth_stage = GrowthStage::Flowering;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.5));
        assert_eq!(validation.reason, ValidationReason::HighDryPeriod);
    }

    #[test]
    fn moisture_falls_through_to_validated() {
        let validation = RuleValidator::validate(&base_features(), ml(StressType::MoistureStress, 0.55));
        assert_eq!(validation.stress, StressType::MoistureStress);
        assert_abs_diff_eq!(validation.confidence, 0.55);
        assert_eq!(validation.reason, ValidationReason::Validated);
    }

    #[test]
    fn extreme_heat_confirms() {
        let mut features = base_features();
        features.avg_temp_norm = 0.85;
        features.temp_deviation_norm = 0.75;
        let validation = RuleValidator::validate(&features, ml(StressType::HeatStress, 0.5));
        assert_eq!(validation.reason, ValidationReason::ExtremeHeat);
        assert_abs_diff_eq!(validation.confidence, 0.85);
    }

    #[test]
    fn heat_critical_stage_uses_cotton_boll_development() {
        let mut features = base_features();
        features.crop = CropType::Cotton;
        features.growth_stage = GrowthStage::BollDevelopment;
        features.heat_stress = 0.7;
        let validation = RuleValidator::validate(&features, ml(StressType::HeatStress, 0.6));
        assert_eq!(validation.reason, ValidationReason::CriticalStageHeat);
        assert_abs_diff_eq!(validation.confidence, 0.69, epsilon = 1e-9);
    }

    #[test]
    fn grain_filling_is_not_critical_for_cotton() {
        let mut features = base_features();
        features.crop = CropType::Cotton;
        features.growth_stage = GrowthStage::GrainFilling;
        features.heat_stress = 0.7;
        features.avg_temp_norm = 0.6;
        features.temp_deviation_norm = 0.5;
        let validation = RuleValidator::validate(&features, ml(StressType::HeatStress, 0.6));
        assert_eq!(validation.reason, ValidationReason::Validated);
    }

    #[test]
    fn normal_temperature_suppresses_heat_call() {
        let mut features = base_features();
        features.avg_temp_norm = 0.3;
        features.temp_deviation_norm = 0.2;
        let validation = RuleValidator::validate(&features, ml(StressType::HeatStress, 0.7));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_eq!(validation.reason, ValidationReason::NormalTemperature);
    }

    #[test]
    fn heavy_rainfall_poor_drainage_confirms() {
        let mut features = base_features();
        features.rolling_rainfall_norm = 0.8;
        features.soil_retention = 0.40;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.5));
        assert_eq!(validation.reason, ValidationReason::HeavyRainfallPoorDrainage);
        assert_abs_diff_eq!(validation.confidence, 0.80);
    }

    #[test]
    fn good_drainage_suppresses_waterlogging() {
        let mut features = base_features();
        features.soil_retention = 0.15;
        features.rolling_rainfall_norm = 0.65;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.9));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_abs_diff_eq!(validation.confidence, 0.0);
        assert_eq!(validation.reason, ValidationReason::GoodDrainage);
    }

    #[test]
    fn waterlogging_precedence_poor_drainage_beats_good_drainage() {
        // Sandy soil but torrential week: rule order matters and the
        // confirmation rule sits first only when retention is high.
        let mut features = base_features();
        features.rolling_rainfall_norm = 0.8;
        features.soil_retention = 0.15;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.6));
        assert_eq!(validation.reason, ValidationReason::GoodDrainage);
    }

    #[test]
    fn recent_heavy_rain_amplifies() {
        let mut features = base_features();
        features.rainfall_norm = 0.85;
        features.rolling_rainfall_norm = 0.65;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.7));
        assert_eq!(validation.reason, ValidationReason::RecentHeavyRain);
        assert_abs_diff_eq!(validation.confidence, 0.77, epsilon = 1e-9);
    }

    #[test]
    fn insufficient_rainfall_suppresses_waterlogging() {
        let mut features = base_features();
        features.rolling_rainfall_norm = 0.2;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.6));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_eq!(validation.reason, ValidationReason::InsufficientRainfall);
    }

    #[test]
    fn waterlogging_falls_through_to_validated() {
        let mut features = base_features();
        features.rolling_rainfall_norm = 0.4;
        features.soil_retention = 0.30;
        let validation = RuleValidator::validate(&features, ml(StressType::Waterlogging, 0.55));
        assert_eq!(validation.reason, ValidationReason::Validated);
        assert_abs_diff_eq!(validation.confidence, 0.55);
    }

    #[test]
    fn no_stress_overridden_by_critical_indicator_in_order() {
        let mut features = base_features();
        features.moisture_stress = 0.85;
        features.heat_stress = 0.85;
        let validation = RuleValidator::validate(&features, ml(StressType::NoStress, 0.6));
        // Moisture is checked before heat.
        assert_eq!(validation.stress, StressType::MoistureStress);
        assert_abs_diff_eq!(validation.confidence, 0.75);
        assert_eq!(validation.reason, ValidationReason::RuleOverrideMoisture);

        features.moisture_stress = 0.4;
        let validation = RuleValidator::validate(&features, ml(StressType::NoStress, 0.6));
        assert_eq!(validation.reason, ValidationReason::RuleOverrideHeat);

        features.heat_stress = 0.4;
        features.waterlogging = 0.85;
        let validation = RuleValidator::validate(&features, ml(StressType::NoStress, 0.6));
        assert_eq!(validation.reason, ValidationReason::RuleOverrideWaterlogging);
    }

    #[test]
    fn quiet_no_stress_keeps_classifier_confidence() {
        let validation = RuleValidator::validate(&base_features(), ml(StressType::NoStress, 0.88));
        assert_eq!(validation.stress, StressType::NoStress);
        assert_abs_diff_eq!(validation.confidence, 0.88);
        assert_eq!(validation.reason, ValidationReason::ValidatedNoStress);
    }

    #[test]
    fn unknown_crop_has_no_critical_stages() {
        let mut features = base_features();
        features.crop = CropType::Unknown;
        features.growth_stage = GrowthStage::Unknown;
        features.moisture_stress = 0.6;
        let validation = RuleValidator::validate(&features, ml(StressType::MoistureStress, 0.5));
        assert_eq!(validation.reason, ValidationReason::Validated);
    }
}

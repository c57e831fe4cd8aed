//! Explanation synthesis
//!
//! Pure template-fill functions producing the human-readable explanation and
//! the advisory for a validated prediction. Fragments are selected by stress
//! type and feature thresholds, assembled in fixed order with single-space
//! separators; advisories are fixed three-tier messages per stress type.

use crate::types::{FeatureVector, GrowthStage, Severity, StressType};

/// Build the narrative explanation for a validated stress call.
pub fn explanation(stress: StressType, features: &FeatureVector) -> String {
    match stress {
        StressType::NoStress => explain_no_stress(features),
        StressType::MoistureStress => explain_moisture_stress(features),
        StressType::HeatStress => explain_heat_stress(features),
        StressType::Waterlogging => explain_waterlogging(features),
    }
}

fn explain_no_stress(features: &FeatureVector) -> String {
    format!(
        "Crop is currently in {} stage with favorable conditions. \
         Weather parameters are within normal range for {} season. \
         Continue regular monitoring and field management practices.",
        features.growth_stage.as_str(),
        features.season
    )
}

fn explain_moisture_stress(features: &FeatureVector) -> String {
    let mut parts = vec![format!(
        "Moisture stress detected in {} during {} stage.",
        features.crop_label,
        features.growth_stage.as_str()
    )];

    if features.dry_days_norm > 0.5 {
        let dry_days_approx = (features.dry_days_norm * 14.0).round() as i64;
        parts.push(format!(
            "Field has experienced approximately {dry_days_approx} consecutive dry days."
        ));
    }

    if features.rolling_rainfall_norm < 0.4 {
        parts.push(format!(
            "Recent rainfall has been below normal levels for {} season.",
            features.season
        ));
    }

    parts.push(format!(
        "Soil type ({}) has moderate water retention capacity.",
        features.soil_type
    ));

    if matches!(
        features.growth_stage,
        GrowthStage::Flowering | GrowthStage::GrainFilling
    ) {
        parts.push(
            "This is a critical growth stage - moisture stress can significantly impact yield."
                .to_string(),
        );
    }

    parts.push(format!("Seasonal baseline applied: {}.", features.season));

    parts.join(" ")
}

fn explain_heat_stress(features: &FeatureVector) -> String {
    // Invert the [15, 45] °C normalization for display.
    let estimated_temp = 15.0 + features.avg_temp_norm * 30.0;

    let mut parts = vec![format!(
        "Heat stress detected in {} during {} stage.",
        features.crop_label,
        features.growth_stage.as_str()
    )];

    parts.push(format!(
        "Current temperatures (approximately {estimated_temp:.1}\u{b0}C) are above optimal range."
    ));

    if features.temp_deviation_norm > 0.6 {
        parts.push(
            "Temperatures are significantly higher than historical averages for this period."
                .to_string(),
        );
    }

    parts.push("High temperatures increase evapotranspiration, raising water demand.".to_string());

    if matches!(
        features.growth_stage,
        GrowthStage::Flowering | GrowthStage::GrainFilling
    ) {
        parts.push(
            "Heat stress during this critical stage can cause flower abortion and reduce grain formation."
                .to_string(),
        );
    }

    parts.push(format!("Seasonal baseline applied: {}.", features.season));

    parts.join(" ")
}

fn explain_waterlogging(features: &FeatureVector) -> String {
    let mut parts = vec![format!(
        "Waterlogging risk detected in {} during {} stage.",
        features.crop_label,
        features.growth_stage.as_str()
    )];

    if features.rolling_rainfall_norm > 0.6 {
        // Invert the [0, 200] mm normalization for display.
        let estimated_rainfall = (features.rolling_rainfall_norm * 200.0) as i64;
        parts.push(format!(
            "Cumulative rainfall over past 7 days (approximately {estimated_rainfall}mm) is above normal."
        ));
    }

    if features.soil_retention > 0.35 {
        parts.push(format!(
            "Soil type ({}) has high water retention, reducing drainage efficiency.",
            features.soil_type
        ));
    }

    parts.push(
        "Excess water reduces soil oxygen levels, affecting root respiration and nutrient uptake."
            .to_string(),
    );

    if matches!(
        features.growth_stage,
        GrowthStage::Germination | GrowthStage::Vegetative | GrowthStage::Tillering
    ) {
        parts.push(
            "Waterlogging during early growth stages can severely damage root systems.".to_string(),
        );
    }

    parts.push(format!("Seasonal baseline applied: {}.", features.season));

    parts.join(" ")
}

/// Actionable advisory for a stress call at a given severity.
pub fn advisory(stress: StressType, severity: Severity) -> String {
    let text = match stress {
        StressType::NoStress => {
            "Continue regular field monitoring and standard crop management practices."
        }
        StressType::MoistureStress => match severity {
            Severity::High => {
                "Increase irrigation frequency by 30-40% immediately. Apply mulch to reduce \
                 evaporation. Monitor soil moisture daily."
            }
            Severity::Medium => {
                "Increase irrigation frequency by 20%. Consider light irrigation at critical \
                 times. Monitor crop stress symptoms."
            }
            _ => {
                "Plan supplemental irrigation. Monitor weather forecast and soil moisture levels \
                 closely."
            }
        },
        StressType::HeatStress => match severity {
            Severity::High => {
                "Increase irrigation to maintain soil moisture. Avoid field operations during \
                 peak heat hours. Consider protective measures for sensitive stages."
            }
            Severity::Medium => {
                "Maintain adequate soil moisture through regular irrigation. Monitor crop canopy \
                 temperature. Avoid stress-inducing operations."
            }
            _ => "Ensure adequate water supply. Monitor temperature trends and crop response.",
        },
        StressType::Waterlogging => match severity {
            Severity::High => {
                "Implement emergency drainage immediately. Avoid field operations to prevent \
                 soil compaction. Monitor for disease symptoms."
            }
            Severity::Medium => {
                "Improve field drainage. Reduce irrigation. Allow soil to dry before next \
                 irrigation cycle."
            }
            _ => {
                "Monitor drainage conditions. Adjust irrigation schedule based on rainfall. \
                 Check soil moisture before irrigation."
            }
        },
    };
    text.to_string()
}

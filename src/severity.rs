//! Severity scoring
//!
//! Maps a validated stress call to a discrete severity level and display
//! color. Base severity comes from confidence thresholds; contextual
//! escalations (critical growth stage, sandy soil under moisture stress,
//! summer heat) each raise one level, capped at high.

use crate::types::{FeatureVector, GrowthStage, Severity, SeverityColor, StressType};

/// Stages where any stress escalates one level, regardless of crop.
const ESCALATION_STAGES: [GrowthStage; 3] = [
    GrowthStage::Flowering,
    GrowthStage::GrainFilling,
    GrowthStage::BollDevelopment,
];

/// Severity scorer: total over all inputs, no failure path.
pub struct SeverityScorer;

impl SeverityScorer {
    /// Score a validated stress call. No-stress always yields (none, green).
    pub fn score(
        stress: StressType,
        confidence: f64,
        features: &FeatureVector,
    ) -> (Severity, SeverityColor) {
        if stress == StressType::NoStress {
            return (Severity::None, SeverityColor::Green);
        }

        let mut severity = if confidence >= 0.80 {
            Severity::High
        } else if confidence >= 0.60 {
            Severity::Medium
        } else {
            Severity::Low
        };

        if ESCALATION_STAGES.contains(&features.growth_stage) {
            severity = escalate(severity);
        }

        // Sandy soil worsens moisture stress.
        if stress == StressType::MoistureStress
            && features.soil_retention < 0.20
            && severity == Severity::Medium
        {
            severity = Severity::High;
        }

        // Summer compounds heat stress.
        if stress == StressType::HeatStress
            && features.season_encoded == 2
            && severity == Severity::Medium
        {
            severity = Severity::High;
        }

        (severity, color_for(severity))
    }
}

fn escalate(severity: Severity) -> Severity {
    match severity {
        Severity::Low => Severity::Medium,
        Severity::Medium => Severity::High,
        other => other,
    }
}

fn color_for(severity: Severity) -> SeverityColor {
    match severity {
        Severity::None => SeverityColor::Green,
        Severity::Low => SeverityColor::Yellow,
        Severity::Medium => SeverityColor::Amber,
        Severity::High => SeverityColor::Red,
    }
}

/// Per-type confidence and indicator thresholds backing each severity level,
/// exposed for introspection. Empty for no-stress.
pub fn severity_thresholds(stress: StressType) -> &'static [(Severity, f64, f64)] {
    match stress {
        StressType::MoistureStress => &[
            (Severity::Low, 0.45, 0.50),
            (Severity::Medium, 0.60, 0.65),
            (Severity::High, 0.80, 0.80),
        ],
        StressType::HeatStress => &[
            (Severity::Low, 0.45, 0.55),
            (Severity::Medium, 0.60, 0.70),
            (Severity::High, 0.80, 0.85),
        ],
        StressType::Waterlogging => &[
            (Severity::Low, 0.45, 0.50),
            (Severity::Medium, 0.60, 0.65),
            (Severity::High, 0.80, 0.80),
        ],
        StressType::NoStress => &[],
    }
}

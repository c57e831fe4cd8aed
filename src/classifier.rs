//! Stress classification
//!
//! A bagged ensemble of CART trees trained once at startup on synthetically
//! generated, rule-labeled feature rows. The ensemble is immutable after
//! training and shared read-only across all prediction calls; training is
//! fully deterministic given a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::tree::{argmax, DecisionTree, TreeParams};
use crate::types::{
    Classification, FeatureVector, ModelInfo, StressType, MODEL_FEATURE_NAMES, N_MODEL_FEATURES,
};

/// Number of stress classes.
pub const N_CLASSES: usize = 4;

/// Trees in the ensemble.
pub const N_TREES: usize = 50;

/// Depth cap per tree.
pub const MAX_DEPTH: usize = 10;

/// Synthetic training rows generated at startup.
pub const N_TRAINING_SAMPLES: usize = 1000;

/// Candidate features per split: floor(sqrt(11)).
const MAX_FEATURES_PER_SPLIT: usize = 3;

const MIN_SAMPLES_SPLIT: usize = 2;

/// Multi-class stress classifier over the 11-feature model row.
#[derive(Debug, Clone)]
pub struct StressClassifier {
    trees: Vec<DecisionTree>,
    /// Forest-level mean-decrease-in-impurity importances, model-row order.
    importance: [f64; N_MODEL_FEATURES],
    seed: u64,
}

impl StressClassifier {
    /// Train the ensemble from scratch. Idempotent: the same seed always
    /// produces the same forest.
    pub fn train(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (x, y) = synthetic_training_set(&mut rng, N_TRAINING_SAMPLES);
        let weights = balanced_sample_weights(&y, N_CLASSES);
        let params = TreeParams {
            max_depth: MAX_DEPTH,
            max_features: MAX_FEATURES_PER_SPLIT,
            min_samples_split: MIN_SAMPLES_SPLIT,
        };

        let mut trees = Vec::with_capacity(N_TREES);
        for _ in 0..N_TREES {
            // Bootstrap resample, then grow one tree on the replicate.
            let indices: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
            let bag_x: Vec<Vec<f64>> = indices.iter().map(|&i| x[i].clone()).collect();
            let bag_y: Vec<usize> = indices.iter().map(|&i| y[i]).collect();
            let bag_w: Vec<f64> = indices.iter().map(|&i| weights[i]).collect();
            trees.push(DecisionTree::fit(
                &bag_x,
                &bag_y,
                &bag_w,
                N_MODEL_FEATURES,
                N_CLASSES,
                &params,
                &mut rng,
            ));
        }

        let mut importance = [0.0; N_MODEL_FEATURES];
        for tree in &trees {
            for (total, value) in importance.iter_mut().zip(tree.feature_importance()) {
                *total += value;
            }
        }
        let sum: f64 = importance.iter().sum();
        if sum > 0.0 {
            for value in &mut importance {
                *value /= sum;
            }
        }

        debug!(
            n_trees = N_TREES,
            n_samples = N_TRAINING_SAMPLES,
            seed,
            "trained stress classifier"
        );

        Self { trees, importance, seed }
    }

    /// Averaged class probability distribution across the forest.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; N_CLASSES] {
        let mut proba = [0.0; N_CLASSES];
        for tree in &self.trees {
            for (total, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *total += p;
            }
        }
        for p in &mut proba {
            *p /= self.trees.len() as f64;
        }
        proba
    }

    /// Classify an engineered feature vector. The predicted type is the
    /// argmax of the averaged distribution, ties broken by fixed class
    /// ordering (moisture, heat, waterlogging, no stress).
    pub fn classify(&self, features: &FeatureVector) -> Classification {
        let proba = self.predict_proba(&features.model_row());
        let class = argmax(&proba);
        Classification {
            stress: StressType::from_class_index(class),
            confidence: proba[class].clamp(0.0, 1.0),
        }
    }

    /// Per-feature importance weights, paired with canonical feature names.
    pub fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        MODEL_FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.importance.iter().copied())
            .collect()
    }

    /// Classifier metadata for introspection.
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: "bagged_decision_trees".to_string(),
            n_trees: N_TREES,
            max_depth: MAX_DEPTH,
            features: MODEL_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            stress_types: StressType::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Generate uniformly sampled feature rows labeled by the fixed precedence
/// rules: moisture, then heat, then waterlogging, else no stress.
fn synthetic_training_set(rng: &mut StdRng, n_samples: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut x = Vec::with_capacity(n_samples);
    let mut y = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let days = f64::from(rng.gen_range(0..150));
        let season = f64::from(rng.gen_range(0..3));
        let soil = rng.gen_range(0.15..0.45);
        let temp = rng.gen_range(0.0..1.0);
        let rain = rng.gen_range(0.0..1.0);
        let rolling_rain = rng.gen_range(0.0..1.0);
        let dry_days = rng.gen_range(0.0..1.0);
        let temp_deviation = rng.gen_range(0.0..1.0);
        let moisture_indicator = rng.gen_range(0.0..1.0);
        let heat_indicator = rng.gen_range(0.0..1.0);
        let waterlogging_indicator = rng.gen_range(0.0..1.0);

        let label = if moisture_indicator > 0.6 && dry_days > 0.5 {
            StressType::MoistureStress
        } else if heat_indicator > 0.7 && temp_deviation > 0.6 {
            StressType::HeatStress
        } else if waterlogging_indicator > 0.7 && rolling_rain > 0.7 {
            StressType::Waterlogging
        } else {
            StressType::NoStress
        };

        x.push(vec![
            days,
            season,
            soil,
            temp,
            rain,
            rolling_rain,
            dry_days,
            temp_deviation,
            moisture_indicator,
            heat_indicator,
            waterlogging_indicator,
        ]);
        y.push(label.class_index());
    }

    (x, y)
}

/// Per-sample weights equalizing class influence:
/// `n_samples / (n_classes * count(class))`.
fn balanced_sample_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0_f64; n_classes];
    for &label in y {
        counts[label] += 1.0;
    }
    let n = y.len() as f64;
    let class_weights: Vec<f64> = counts
        .iter()
        .map(|&count| n / (n_classes as f64 * count.max(1.0)))
        .collect();
    y.iter().map(|&label| class_weights[label]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    /// Model row deep inside one labeled region of the synthetic space.
    fn row(
        moisture: f64,
        heat: f64,
        water: f64,
        dry_days: f64,
        temp_deviation: f64,
        rolling_rain: f64,
    ) -> Vec<f64> {
        vec![
            60.0, 1.0, 0.30, 0.4, 0.2, rolling_rain, dry_days, temp_deviation, moisture, heat,
            water,
        ]
    }

    #[test]
    fn training_is_deterministic() {
        let a = StressClassifier::train(42);
        let b = StressClassifier::train(42);

        for ((_, wa), (_, wb)) in a.feature_importance().iter().zip(b.feature_importance()) {
            assert_eq!(wa.to_bits(), wb.to_bits());
        }

        let sample = row(0.9, 0.1, 0.1, 0.9, 0.2, 0.1);
        let pa = a.predict_proba(&sample);
        let pb = b.predict_proba(&sample);
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn different_seeds_build_different_forests() {
        let a = StressClassifier::train(42);
        let b = StressClassifier::train(43);
        let same = a
            .feature_importance()
            .iter()
            .zip(b.feature_importance())
            .all(|((_, wa), (_, wb))| *wa == wb);
        assert!(!same);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = StressClassifier::train(42);
        let proba = model.predict_proba(&row(0.5, 0.5, 0.5, 0.5, 0.5, 0.5));
        let sum: f64 = proba.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn deep_moisture_region_classifies_as_moisture() {
        let model = StressClassifier::train(42);
        let proba = model.predict_proba(&row(0.95, 0.1, 0.1, 0.95, 0.1, 0.05));
        let class = argmax(&proba);
        assert_eq!(StressType::from_class_index(class), StressType::MoistureStress);
        assert!(proba[class] > 0.45, "confidence too low: {}", proba[class]);
    }

    #[test]
    fn deep_heat_region_classifies_as_heat() {
        let model = StressClassifier::train(42);
        let proba = model.predict_proba(&row(0.1, 0.95, 0.1, 0.1, 0.95, 0.05));
        let class = argmax(&proba);
        assert_eq!(StressType::from_class_index(class), StressType::HeatStress);
    }

    #[test]
    fn deep_waterlogging_region_classifies_as_waterlogging() {
        let model = StressClassifier::train(42);
        let proba = model.predict_proba(&row(0.1, 0.1, 0.95, 0.05, 0.1, 0.95));
        let class = argmax(&proba);
        assert_eq!(StressType::from_class_index(class), StressType::Waterlogging);
    }

    #[test]
    fn quiet_region_classifies_as_no_stress() {
        let model = StressClassifier::train(42);
        let proba = model.predict_proba(&row(0.1, 0.1, 0.1, 0.1, 0.1, 0.1));
        let class = argmax(&proba);
        assert_eq!(StressType::from_class_index(class), StressType::NoStress);
    }

    #[test]
    fn importance_covers_all_features_and_sums_to_one() {
        let model = StressClassifier::train(42);
        let importance = model.feature_importance();
        assert_eq!(importance.len(), N_MODEL_FEATURES);
        assert!(importance.iter().all(|(_, w)| *w >= 0.0));
        let sum: f64 = importance.iter().map(|(_, w)| w).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
        assert_eq!(importance[0].0, "days_after_sowing");
    }

    #[test]
    fn balanced_weights_equalize_class_mass() {
        let y = vec![0, 0, 0, 1];
        let weights = balanced_sample_weights(&y, 2);
        let class0: f64 = weights[..3].iter().sum();
        let class1 = weights[3];
        assert_abs_diff_eq!(class0, class1, epsilon = 1e-9);
    }

    #[test]
    fn info_reports_hyperparameters() {
        let model = StressClassifier::train(42);
        let info = model.info();
        assert_eq!(info.n_trees, N_TREES);
        assert_eq!(info.max_depth, MAX_DEPTH);
        assert_eq!(info.features.len(), N_MODEL_FEATURES);
        assert_eq!(info.stress_types.len(), N_CLASSES);
        assert_eq!(model.n_trees(), N_TREES);
    }
}

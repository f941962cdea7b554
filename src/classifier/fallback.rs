//! Rule-based fallback scoring
//!
//! Used when no model artifact is loaded or inference fails:
//!
//!   optical = 0.7 × cultivated_fraction + 0.3 × max(0, mean_ndvi)
//!   fused   = 0.7 × optical + 0.3 × radar_score
//!
//! Feature importance here is a fixed illustrative weighting.

use std::collections::BTreeMap;

use super::{ClassificationResult, Decision};
use crate::data::ParcelStatistics;
use crate::utils::{clamp_unit, round_to};

const FIXED_IMPORTANCE: [(&str, f64); 5] = [
    ("cultivated_fraction", 0.35),
    ("mean_ndvi", 0.15),
    ("radar_score", 0.30),
    ("elevation", 0.10),
    ("slope", 0.10),
];

/// Deterministic fused optical + radar score
pub fn rule_based_classification(stats: &ParcelStatistics) -> ClassificationResult {
    if stats.plot_area_sq_m <= 0.0 || !stats.plot_area_sq_m.is_finite() {
        return ClassificationResult {
            agricultural_probability: 0.0,
            decision: Decision::Review,
            feature_importance: BTreeMap::new(),
            using_learned_model: false,
        };
    }

    let cultivated_fraction = stats.cultivated_fraction();
    let optical_score = 0.7 * cultivated_fraction + 0.3 * stats.mean_ndvi.max(0.0);
    let fused = clamp_unit(0.7 * optical_score + 0.3 * stats.radar_score());

    ClassificationResult {
        agricultural_probability: round_to(fused, 4),
        decision: Decision::from_probability(fused),
        feature_importance: FIXED_IMPORTANCE
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        using_learned_model: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_degenerate_plot_is_review() {
        let result = rule_based_classification(&ParcelStatistics::default());
        assert_eq!(result.decision, Decision::Review);
        assert_eq!(result.agricultural_probability, 0.0);
        assert!(result.feature_importance.is_empty());
    }

    #[test]
    fn test_full_cropland_passes() {
        let stats = ParcelStatistics {
            plot_area_sq_m: 5_000.0,
            cropland_area_sq_m: 5_000.0,
            mean_ndvi: 1.0,
            vh_vv_ratio: Some(0.7),
            mean_vh_db: Some(-8.0),
            ..Default::default()
        };
        let result = rule_based_classification(&stats);
        assert!(result.agricultural_probability > 0.7);
        assert_eq!(result.decision, Decision::Pass);
        assert!(!result.using_learned_model);
    }

    #[test]
    fn test_missing_radar_uses_neutral() {
        let stats = ParcelStatistics {
            plot_area_sq_m: 1_000.0,
            cropland_area_sq_m: 500.0,
            mean_ndvi: 0.5,
            ..Default::default()
        };
        // optical = 0.35 + 0.15 = 0.5; fused = 0.35 + 0.15 = 0.5
        let result = rule_based_classification(&stats);
        assert_relative_eq!(result.agricultural_probability, 0.5, epsilon = 1e-9);
        assert_eq!(result.decision, Decision::Review);
    }

    #[test]
    fn test_negative_ndvi_ignored() {
        let stats = ParcelStatistics {
            plot_area_sq_m: 1_000.0,
            cropland_area_sq_m: 0.0,
            mean_ndvi: -0.4,
            vh_vv_ratio: Some(0.05),
            mean_vh_db: Some(-25.0),
            ..Default::default()
        };
        let result = rule_based_classification(&stats);
        assert_relative_eq!(result.agricultural_probability, 0.015, epsilon = 1e-9);
        assert_eq!(result.decision, Decision::Fail);
    }

    #[test]
    fn test_importance_sums_to_one() {
        let stats = ParcelStatistics { plot_area_sq_m: 1.0, ..Default::default() };
        let result = rule_based_classification(&stats);
        assert_relative_eq!(result.feature_importance.values().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}

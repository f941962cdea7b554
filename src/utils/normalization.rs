//! Normalization Utilities
//!
//! Rounding and weight-normalization helpers shared by the classifier, the
//! yield engine and the parcel report.

use std::collections::BTreeMap;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp to the unit interval. NaN maps to 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// L1-normalize a weight map so the values sum to 1.0, rounding each weight
/// to `decimals` places.
///
/// Negative and non-finite weights are dropped. An all-zero (or empty) map
/// returns the remaining keys unchanged at 0.0.
pub fn l1_normalize(weights: &BTreeMap<String, f64>, decimals: i32) -> BTreeMap<String, f64> {
    let kept: BTreeMap<&String, f64> = weights
        .iter()
        .filter(|(_, v)| v.is_finite() && **v >= 0.0)
        .map(|(k, v)| (k, *v))
        .collect();

    let total: f64 = kept.values().sum();
    let total = if total > 0.0 { total } else { 1.0 };

    kept.into_iter()
        .map(|(k, v)| (k.clone(), round_to(v / total, decimals)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.90899, 4), 0.909);
        assert_eq!(round_to(2.345, 1), 2.3);
        assert_eq!(round_to(-0.00004, 4), -0.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_l1_normalize_sums_to_one() {
        let mut w = BTreeMap::new();
        w.insert("ndvi_mean".to_string(), 30.0);
        w.insert("vh_vv_ratio".to_string(), 10.0);
        w.insert("slope_deg".to_string(), 10.0);
        let n = l1_normalize(&w, 3);
        assert_relative_eq!(n.values().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_eq!(n["ndvi_mean"], 0.6);
    }

    #[test]
    fn test_l1_normalize_drops_invalid() {
        let mut w = BTreeMap::new();
        w.insert("a".to_string(), f64::NAN);
        w.insert("b".to_string(), -1.0);
        w.insert("c".to_string(), 2.0);
        let n = l1_normalize(&w, 3);
        assert_eq!(n.len(), 1);
        assert_eq!(n["c"], 1.0);
    }
}

//! Radar Crop Score
//!
//! Heuristic cropland likelihood from C-band backscatter. Cultivated and
//! rough vegetated surfaces show a higher cross-polarisation ratio (VH/VV)
//! and a stronger VH return than smooth water or a uniform forest canopy.
//!
//! | Surface   | VH/VV ratio | VH (dB)      |
//! |-----------|-------------|--------------|
//! | Cropland  | > 0.5       | > -12        |
//! | Forest    | < 0.3       | -18 .. -12   |
//! | Water     | low         | < -20        |

use crate::utils::round_to;

/// Score returned when radar coverage is missing
pub const NEUTRAL_RADAR_SCORE: f64 = 0.5;

/// Maximum contribution of the VH/VV ratio component
const RATIO_WEIGHT: f64 = 0.6;

/// Maximum contribution of the VH intensity component
const INTENSITY_WEIGHT: f64 = 0.4;

/// Score how strongly the radar signature indicates cropland (0.0-1.0).
///
/// Returns [`NEUTRAL_RADAR_SCORE`] when either input is unavailable; missing
/// radar coverage is common and must not drag the fused score to zero.
pub fn radar_crop_score(vh_vv_ratio: Option<f64>, mean_vh_db: Option<f64>) -> f64 {
    let (Some(ratio), Some(vh_db)) = (
        vh_vv_ratio.filter(|v| v.is_finite()),
        mean_vh_db.filter(|v| v.is_finite()),
    ) else {
        return NEUTRAL_RADAR_SCORE;
    };

    let score = ratio_component(ratio) + intensity_component(vh_db);
    round_to(score.clamp(0.0, 1.0), 4)
}

/// VH/VV ratio component (0-0.6): saturates above 0.5, linear 0.3-0.5
fn ratio_component(ratio: f64) -> f64 {
    if ratio > 0.5 {
        RATIO_WEIGHT
    } else if ratio > 0.3 {
        0.3 + 0.3 * ((ratio - 0.3) / 0.2)
    } else {
        ratio.max(0.0)
    }
}

/// VH intensity component (0-0.4): saturates above -12 dB, linear to -18 dB,
/// then a residual tail that reaches zero at -22 dB
fn intensity_component(vh_db: f64) -> f64 {
    if vh_db > -12.0 {
        INTENSITY_WEIGHT
    } else if vh_db > -18.0 {
        0.2 + 0.2 * ((vh_db + 18.0) / 6.0)
    } else {
        (0.1 + 0.1 * ((vh_db + 20.0) / 2.0)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_neutral_without_coverage() {
        assert_eq!(radar_crop_score(None, Some(-10.0)), 0.5);
        assert_eq!(radar_crop_score(Some(0.6), None), 0.5);
        assert_eq!(radar_crop_score(None, None), 0.5);
        assert_eq!(radar_crop_score(Some(f64::NAN), Some(-10.0)), 0.5);
    }

    #[test]
    fn test_saturated_cropland_signature() {
        assert_eq!(radar_crop_score(Some(0.6), Some(-10.0)), 1.0);
    }

    #[test]
    fn test_forest_signature() {
        // ratio 0.25 → 0.25; -15 dB → 0.2 + 0.2 * 0.5 = 0.3
        assert_relative_eq!(radar_crop_score(Some(0.25), Some(-15.0)), 0.55, epsilon = 1e-9);
    }

    #[test]
    fn test_water_signature() {
        // ratio 0.1 → 0.1; -23 dB → tail clamped at 0
        assert_relative_eq!(radar_crop_score(Some(0.1), Some(-23.0)), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_components_are_continuous() {
        assert_relative_eq!(ratio_component(0.3), 0.3, epsilon = 1e-12);
        assert_relative_eq!(ratio_component(0.5), 0.6, epsilon = 1e-12);
        assert_relative_eq!(intensity_component(-18.0), 0.2, epsilon = 1e-12);
        assert_relative_eq!(intensity_component(-12.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_strictly_increasing_in_ratio() {
        let mut previous = -1.0;
        for step in 1..=50 {
            let ratio = step as f64 * 0.01;
            let s = radar_crop_score(Some(ratio), Some(-15.0));
            assert!(s > previous, "not increasing at ratio {}", ratio);
            previous = s;
        }
    }

    #[test]
    fn test_always_bounded() {
        for ratio in [-1.0, 0.0, 0.4, 2.0] {
            for db in [-40.0, -19.0, -14.0, 0.0, 10.0] {
                let s = radar_crop_score(Some(ratio), Some(db));
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}

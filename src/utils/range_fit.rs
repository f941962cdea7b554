//! Range Fit Scoring
//!
//! Maps an observed value against an ideal `[min, max]` interval to a bounded
//! fit score in `[0, 1]`. Inside the interval the score is 1.0; outside it the
//! score degrades linearly and reaches 0.0 once the observation is half a
//! range-width (or the unit floor, whichever is larger) beyond the nearest
//! boundary. Sensor noise and crop tolerance make a hard pass/fail cut-off the
//! wrong model here.

/// Smallest margin used for temperature, rainfall and percentage quantities.
pub const PERCENT_LIKE_FLOOR: f64 = 5.0;

/// Smallest margin used for volumetric soil-moisture fractions (m³/m³).
pub const MOISTURE_FRACTION_FLOOR: f64 = 0.05;

/// Score `actual` against `[ideal_min, ideal_max]` with the default
/// (temperature / percentage) margin floor.
pub fn range_score(actual: f64, ideal_min: f64, ideal_max: f64) -> f64 {
    range_score_with_floor(actual, ideal_min, ideal_max, PERCENT_LIKE_FLOOR)
}

/// Score `actual` against `[ideal_min, ideal_max]` with an explicit margin floor.
///
/// Always returns a finite value in `[0, 1]`, including for NaN inputs
/// (scored 0.0) and inverted ranges.
pub fn range_score_with_floor(actual: f64, ideal_min: f64, ideal_max: f64, floor: f64) -> f64 {
    if ideal_min <= actual && actual <= ideal_max {
        return 1.0;
    }

    let margin = ((ideal_max - ideal_min) * 0.5).max(floor);
    let distance = if actual < ideal_min {
        ideal_min - actual
    } else {
        actual - ideal_max
    };

    let score = 1.0 - distance / margin;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

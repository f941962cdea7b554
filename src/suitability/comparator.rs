//! Condition Comparator
//!
//! Scores observed weather and vegetation against a crop's ideal envelope.
//! Every parameter score is in [0, 1]; the overall score is a fixed weighted
//! sum, order-independent by construction.

use serde::{Deserialize, Serialize};

use super::crop_table::CropProfile;
use crate::data::WeatherObservation;
use crate::metrics::vegetation_health_score;
use crate::utils::{
    clamp_unit, range_score, range_score_with_floor, round_to, MOISTURE_FRACTION_FLOOR,
};

/// Overall-score weights
pub const TEMPERATURE_WEIGHT: f64 = 0.25;
pub const RAINFALL_WEIGHT: f64 = 0.25;
pub const HUMIDITY_WEIGHT: f64 = 0.10;
pub const SOIL_MOISTURE_WEIGHT: f64 = 0.15;
pub const VEGETATION_WEIGHT: f64 = 0.25;

/// Soil score when no soil moisture was observed
pub const NEUTRAL_SOIL_SCORE: f64 = 0.5;

/// Where an observed value falls relative to an ideal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeFit {
    BelowRange,
    WithinRange,
    AboveRange,
}

impl RangeFit {
    pub fn classify(actual: f64, min: f64, max: f64) -> Self {
        if actual < min {
            RangeFit::BelowRange
        } else if actual > max {
            RangeFit::AboveRange
        } else {
            RangeFit::WithinRange
        }
    }
}

/// Per-parameter suitability (2 decimals) and weighted overall (4 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityScores {
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    pub vegetation: f64,
    pub overall: f64,
}

impl SuitabilityScores {
    /// Overall as a percentage (1 decimal)
    pub fn overall_pct(&self) -> f64 {
        round_to(self.overall * 100.0, 1)
    }
}

/// Soil moisture fit; exactly 0.0 means "no data" and scores neutral
pub fn soil_moisture_score(actual: f64, min: f64, max: f64) -> f64 {
    if actual == 0.0 {
        return NEUTRAL_SOIL_SCORE;
    }
    range_score_with_floor(actual, min, max, MOISTURE_FRACTION_FLOOR)
}

/// Compare observed conditions against a crop profile
pub fn compare_conditions(
    profile: &CropProfile,
    weather: &WeatherObservation,
    mean_ndvi: f64,
) -> SuitabilityScores {
    let temperature = range_score(weather.avg_temp_c, profile.temp_min_c, profile.temp_max_c);
    let rainfall = range_score(
        weather.total_rainfall_mm,
        profile.rainfall_min_mm,
        profile.rainfall_max_mm,
    );
    let humidity = range_score(
        weather.avg_humidity_pct,
        profile.humidity_min_pct,
        profile.humidity_max_pct,
    );
    let soil_moisture = soil_moisture_score(weather.avg_soil_moisture, profile.soil_min, profile.soil_max);
    let vegetation = vegetation_health_score(mean_ndvi);

    let overall = clamp_unit(
        TEMPERATURE_WEIGHT * temperature
            + RAINFALL_WEIGHT * rainfall
            + HUMIDITY_WEIGHT * humidity
            + SOIL_MOISTURE_WEIGHT * soil_moisture
            + VEGETATION_WEIGHT * vegetation,
    );

    SuitabilityScores {
        temperature: round_to(temperature, 2),
        rainfall: round_to(rainfall, 2),
        humidity: round_to(humidity, 2),
        soil_moisture: round_to(soil_moisture, 2),
        vegetation: round_to(vegetation, 2),
        overall: round_to(overall, 4),
    }
}

//! Feature Extraction
//!
//! Builds the fixed 8-feature vector (optical, radar, terrain, weather) the
//! learned model was trained on.

use serde::{Deserialize, Serialize};

use crate::data::{ParcelStatistics, WeatherObservation};

/// Feature names in the order expected by the model
pub const FEATURE_NAMES: [&str; 8] = [
    "ndvi_mean",
    "ndvi_stddev",
    "vh_mean_db",
    "vh_vv_ratio",
    "elevation_m",
    "slope_deg",
    "rainfall_mm",
    "soil_moisture",
];

/// Number of model input features
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Per-parcel model features; radar fields are absent without radar coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ndvi_mean: Option<f64>,
    pub ndvi_stddev: Option<f64>,
    pub vh_mean_db: Option<f64>,
    pub vh_vv_ratio: Option<f64>,
    pub elevation_m: Option<f64>,
    pub slope_deg: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub soil_moisture: Option<f64>,
}

impl FeatureVector {
    /// Build the vector from parcel statistics and (optional) weather.
    ///
    /// Without weather, rainfall and soil moisture are 0.0.
    pub fn extract(stats: &ParcelStatistics, weather: Option<&WeatherObservation>) -> Self {
        Self {
            ndvi_mean: Some(stats.mean_ndvi),
            ndvi_stddev: Some(stats.ndvi_stddev),
            vh_mean_db: stats.mean_vh_db,
            vh_vv_ratio: stats.vh_vv_ratio,
            elevation_m: Some(stats.elevation_m),
            slope_deg: Some(stats.slope_deg),
            rainfall_mm: Some(weather.map_or(0.0, |w| w.total_rainfall_mm)),
            soil_moisture: Some(weather.map_or(0.0, |w| w.avg_soil_moisture)),
        }
    }

    /// Values in [`FEATURE_NAMES`] order
    pub fn values(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.ndvi_mean,
            self.ndvi_stddev,
            self.vh_mean_db,
            self.vh_vv_ratio,
            self.elevation_m,
            self.slope_deg,
            self.rainfall_mm,
            self.soil_moisture,
        ]
    }

    /// Dense model input; absent or non-finite values become 0.0
    pub fn as_model_input(&self) -> [f64; FEATURE_COUNT] {
        self.values()
            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values()[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stats() -> ParcelStatistics {
        ParcelStatistics {
            plot_area_sq_m: 10_000.0,
            cropland_area_sq_m: 9_000.0,
            mean_ndvi: 0.8,
            ndvi_stddev: 0.12,
            vh_vv_ratio: Some(0.6),
            mean_vh_db: Some(-10.0),
            elevation_m: 42.0,
            slope_deg: 3.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_without_weather() {
        let fv = FeatureVector::extract(&stats(), None);
        assert_eq!(fv.rainfall_mm, Some(0.0));
        assert_eq!(fv.soil_moisture, Some(0.0));
        assert_eq!(fv.get("vh_vv_ratio"), Some(0.6));
        assert_eq!(fv.get("unknown"), None);
    }

    #[test]
    fn test_extract_with_weather() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let weather = WeatherObservation {
            avg_temp_c: 27.0,
            total_rainfall_mm: 640.0,
            avg_humidity_pct: 80.0,
            avg_soil_moisture: 0.31,
            days_sampled: 90,
            period_start: d,
            period_end: d,
        };
        let fv = FeatureVector::extract(&stats(), Some(&weather));
        assert_eq!(fv.as_model_input(), [0.8, 0.12, -10.0, 0.6, 42.0, 3.5, 640.0, 0.31]);
    }

    #[test]
    fn test_missing_radar_becomes_zero_input() {
        let mut s = stats();
        s.vh_vv_ratio = None;
        s.mean_vh_db = None;
        let fv = FeatureVector::extract(&s, None);
        assert_eq!(fv.vh_mean_db, None);
        assert_eq!(fv.as_model_input()[2], 0.0);
        assert_eq!(fv.as_model_input()[3], 0.0);
    }
}

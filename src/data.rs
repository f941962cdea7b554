//! Core Data Model
//!
//! Values produced by the remote-sensing and weather collaborators and
//! consumed by the scorers. All of them are immutable once built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::metrics::radar_crop_score;
use crate::utils::round_to;

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Month-granular time window (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageryWindow {
    pub start_year: i32,
    pub start_month: u32,
    pub end_year: i32,
    pub end_month: u32,
}

impl ImageryWindow {
    /// Build a window; `None` if a month is outside 1-12 or the window is reversed
    pub fn new(start_year: i32, start_month: u32, end_year: i32, end_month: u32) -> Option<Self> {
        let months_ok = (1..=12).contains(&start_month) && (1..=12).contains(&end_month);
        if !months_ok || (start_year, start_month) > (end_year, end_month) {
            return None;
        }
        Some(Self { start_year, start_month, end_year, end_month })
    }

    /// First day of the start month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, 1)
    }

    /// Last day of the end month
    pub fn last_day(&self) -> Option<NaiveDate> {
        last_day_of_month(self.end_year, self.end_month)
    }
}

impl fmt::Display for ImageryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02} to {}-{:02}",
            self.start_year, self.start_month, self.end_year, self.end_month
        )
    }
}

/// Last calendar day of a month
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Per-parcel aggregate remote-sensing output
///
/// Areas are in m², radar in dB. Radar fields are `None` when the parcel had
/// no radar coverage for the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelStatistics {
    pub plot_area_sq_m: f64,
    pub cropland_area_sq_m: f64,
    pub active_vegetation_area_sq_m: f64,
    #[serde(default)]
    pub cultivated_area_sq_m: f64,
    pub mean_ndvi: f64,
    #[serde(default)]
    pub ndvi_stddev: f64,
    #[serde(default)]
    pub mean_vh_db: Option<f64>,
    #[serde(default)]
    pub mean_vv_db: Option<f64>,
    #[serde(default)]
    pub vh_vv_ratio: Option<f64>,
    #[serde(default)]
    pub elevation_m: f64,
    #[serde(default)]
    pub slope_deg: f64,
    #[serde(default)]
    pub land_classes_sq_m: BTreeMap<String, f64>,
}

impl ParcelStatistics {
    /// Copy with every area clamped to `[0, plot_area]`
    ///
    /// The collaborator is supposed to guarantee this already; pixel-area
    /// rounding occasionally pushes sub-areas slightly past the total.
    pub fn sanitized(&self) -> Self {
        let total = finite_or_zero(self.plot_area_sq_m).max(0.0);
        let clamp_area = |a: f64| finite_or_zero(a).clamp(0.0, total);

        Self {
            plot_area_sq_m: total,
            cropland_area_sq_m: clamp_area(self.cropland_area_sq_m),
            active_vegetation_area_sq_m: clamp_area(self.active_vegetation_area_sq_m),
            cultivated_area_sq_m: clamp_area(self.cultivated_area_sq_m),
            land_classes_sq_m: self
                .land_classes_sq_m
                .iter()
                .map(|(k, v)| (k.clone(), clamp_area(*v)))
                .collect(),
            ..self.clone()
        }
    }

    /// Cropland fraction of the plot in `[0, 1]`; 0.0 for a degenerate plot
    pub fn cultivated_fraction(&self) -> f64 {
        if self.plot_area_sq_m <= 0.0 || !self.plot_area_sq_m.is_finite() {
            return 0.0;
        }
        (finite_or_zero(self.cropland_area_sq_m) / self.plot_area_sq_m).clamp(0.0, 1.0)
    }

    /// Radar "looks like cropland" score; neutral 0.5 without radar coverage
    pub fn radar_score(&self) -> f64 {
        radar_crop_score(self.vh_vv_ratio, self.mean_vh_db)
    }

    /// Land-cover class with the largest area, if any class has positive area
    pub fn dominant_class(&self) -> Option<&str> {
        self.land_classes_sq_m
            .iter()
            .filter(|(_, area)| **area > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, _)| name.as_str())
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// One day of weather samples; any field may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    #[serde(default)]
    pub temp_mean_c: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
    #[serde(default)]
    pub humidity_mean_pct: Option<f64>,
    #[serde(default)]
    pub soil_moisture: Option<f64>,
}

/// Aggregated weather for one location and time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub avg_temp_c: f64,
    pub total_rainfall_mm: f64,
    pub avg_humidity_pct: f64,
    /// Volumetric fraction (m³/m³); 0.0 means "no data"
    pub avg_soil_moisture: f64,
    pub days_sampled: usize,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl WeatherObservation {
    /// Aggregate daily samples: means for temperature, humidity and soil
    /// moisture, sum for rainfall. Missing values are skipped per field and an
    /// empty field aggregates to 0.0.
    pub fn aggregate<'a, I>(samples: I, period_start: NaiveDate, period_end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a DailyWeather>,
    {
        let mut temps = FieldAccumulator::default();
        let mut rains = FieldAccumulator::default();
        let mut humids = FieldAccumulator::default();
        let mut soils = FieldAccumulator::default();

        for day in samples {
            temps.push(day.temp_mean_c);
            rains.push(day.precipitation_mm);
            humids.push(day.humidity_mean_pct);
            soils.push(day.soil_moisture);
        }

        Self {
            avg_temp_c: round_to(temps.mean(), 1),
            total_rainfall_mm: round_to(rains.sum, 1),
            avg_humidity_pct: round_to(humids.mean(), 1),
            avg_soil_moisture: round_to(soils.mean(), 4),
            days_sampled: temps.count,
            period_start,
            period_end,
        }
    }

    /// True when soil moisture was actually observed
    pub fn has_soil_moisture(&self) -> bool {
        self.avg_soil_moisture != 0.0
    }

    /// "start → end" period label
    pub fn period_label(&self) -> String {
        format!("{} → {}", self.period_start, self.period_end)
    }
}

#[derive(Default)]
struct FieldAccumulator {
    sum: f64,
    count: usize,
}

impl FieldAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, t: Option<f64>, r: Option<f64>, h: Option<f64>, s: Option<f64>) -> DailyWeather {
        DailyWeather {
            date: NaiveDate::from_ymd_opt(2025, 7, d).unwrap(),
            temp_mean_c: t,
            precipitation_mm: r,
            humidity_mean_pct: h,
            soil_moisture: s,
        }
    }

    #[test]
    fn test_window_validation() {
        assert!(ImageryWindow::new(2025, 1, 2025, 12).is_some());
        assert!(ImageryWindow::new(2025, 13, 2025, 12).is_none());
        assert!(ImageryWindow::new(2025, 6, 2025, 5).is_none());
        assert!(ImageryWindow::new(2024, 11, 2025, 2).is_some());
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(last_day_of_month(2025, 2), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(last_day_of_month(2025, 12), NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn test_sanitized_clamps_sub_areas() {
        let stats = ParcelStatistics {
            plot_area_sq_m: 1000.0,
            cropland_area_sq_m: 1200.0,
            active_vegetation_area_sq_m: -5.0,
            ..Default::default()
        };
        let clean = stats.sanitized();
        assert_eq!(clean.cropland_area_sq_m, 1000.0);
        assert_eq!(clean.active_vegetation_area_sq_m, 0.0);
        assert_eq!(clean.cultivated_fraction(), 1.0);
    }

    #[test]
    fn test_cultivated_fraction_degenerate_plot() {
        let stats = ParcelStatistics { cropland_area_sq_m: 50.0, ..Default::default() };
        assert_eq!(stats.cultivated_fraction(), 0.0);
    }

    #[test]
    fn test_dominant_class() {
        let mut stats = ParcelStatistics::default();
        assert_eq!(stats.dominant_class(), None);
        stats.land_classes_sq_m.insert("Trees".into(), 300.0);
        stats.land_classes_sq_m.insert("Cropland".into(), 700.0);
        assert_eq!(stats.dominant_class(), Some("Cropland"));
    }

    #[test]
    fn test_aggregate_skips_missing_values() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let days = vec![
            day(1, Some(26.0), Some(10.0), Some(80.0), Some(0.30)),
            day(2, Some(28.0), None, Some(90.0), None),
            day(3, None, Some(5.5), None, Some(0.40)),
        ];
        let obs = WeatherObservation::aggregate(&days, start, end);
        assert_eq!(obs.avg_temp_c, 27.0);
        assert_eq!(obs.total_rainfall_mm, 15.5);
        assert_eq!(obs.avg_humidity_pct, 85.0);
        assert_eq!(obs.avg_soil_moisture, 0.35);
        assert_eq!(obs.days_sampled, 2);
        assert!(obs.has_soil_moisture());
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let d = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let obs = WeatherObservation::aggregate(&Vec::<DailyWeather>::new(), d, d);
        assert_eq!(obs.avg_temp_c, 0.0);
        assert_eq!(obs.days_sampled, 0);
        assert!(!obs.has_soil_moisture());
    }
}

//! Yield Feasibility Assessment
//!
//! Scores a claimed crop against the weather it actually experienced and
//! turns the result into a yield estimate.
//!
//! - `evaluate`: scores + reasons + warning for a profile and an observation
//! - `estimate`: resolves the weather window, fetches weather, evaluates,
//!   and scales the baseline yield by the overall score

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use chrono::NaiveDate;

use super::advice::{build_yield_warning, generate_unsuitability_reasons, UnsuitabilityReason, YieldWarning};
use super::comparator::{compare_conditions, SuitabilityScores};
use super::crop_table::{CropProfile, CropTable};
use super::season::{resolve_weather_window, WeatherWindow};
use crate::collaborators::WeatherSource;
use crate::data::{ImageryWindow, Location, WeatherObservation};
use crate::error::WeatherError;
use crate::utils::{clamp_unit, round_to};

/// Overall below this marks a crop unsuitable
pub const DEFAULT_UNSUITABILITY_THRESHOLD: f64 = 0.40;

/// Trailing lookback for year-round crops
pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;

/// Share of the classifier confidence kept when blending in yield feasibility
const CLASSIFIER_CONFIDENCE_SHARE: f64 = 0.8;

/// Confidence label for a feasibility score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YieldConfidence {
    High,
    Moderate,
    Low,
}

impl YieldConfidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            YieldConfidence::High
        } else if score >= 0.4 {
            YieldConfidence::Moderate
        } else {
            YieldConfidence::Low
        }
    }
}

/// Scores, reasons and warning for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEvaluation {
    pub scores: SuitabilityScores,
    pub reasons: Vec<UnsuitabilityReason>,
    pub warning: YieldWarning,
}

/// Ideal envelope echoed back in estimates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealRanges {
    pub temp_c: [f64; 2],
    pub rainfall_mm: [f64; 2],
    pub humidity_pct: [f64; 2],
    pub soil_moisture: [f64; 2],
}

impl From<&CropProfile> for IdealRanges {
    fn from(p: &CropProfile) -> Self {
        Self {
            temp_c: [p.temp_min_c, p.temp_max_c],
            rainfall_mm: [p.rainfall_min_mm, p.rainfall_max_mm],
            humidity_pct: [p.humidity_min_pct, p.humidity_max_pct],
            soil_moisture: [p.soil_min, p.soil_max],
        }
    }
}

/// Yield estimate for a claimed crop on one parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub crop: String,
    /// tons / hectare
    pub baseline_yield: f64,
    /// tons / hectare (2 decimals)
    pub estimated_yield: f64,
    pub parcel_area_ha: f64,
    /// tons (2 decimals)
    pub total_yield: f64,
    pub feasibility_score: f64,
    pub confidence: YieldConfidence,
    pub is_unsuitable: bool,
    pub has_critical_failure: bool,
    pub yield_warning: Option<String>,
    pub reasons: Vec<UnsuitabilityReason>,
    pub scores: SuitabilityScores,
    pub weather: WeatherObservation,
    pub window: WeatherWindow,
    pub ideal: IdealRanges,
}

/// Blend classifier confidence with yield feasibility (4 decimals)
pub fn integrate_yield_score(confidence: f64, feasibility: f64) -> f64 {
    let blended = CLASSIFIER_CONFIDENCE_SHARE * confidence + (1.0 - CLASSIFIER_CONFIDENCE_SHARE) * feasibility;
    round_to(clamp_unit(blended), 4)
}

/// Crop-vs-weather scoring engine; cheap to clone, shares the crop table
#[derive(Debug, Clone)]
pub struct YieldFeasibilityEngine {
    table: Arc<CropTable>,
    lookback_days: u32,
    unsuitability_threshold: f64,
}

impl YieldFeasibilityEngine {
    pub fn new(table: Arc<CropTable>, lookback_days: u32, unsuitability_threshold: f64) -> Self {
        Self { table, lookback_days, unsuitability_threshold }
    }

    pub fn table(&self) -> &CropTable {
        &self.table
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Score one profile against one observation
    pub fn evaluate(
        &self,
        profile: &CropProfile,
        weather: &WeatherObservation,
        mean_ndvi: f64,
    ) -> YieldEvaluation {
        let scores = compare_conditions(profile, weather, mean_ndvi);
        let reasons = generate_unsuitability_reasons(profile, weather, &scores);
        let warning = build_yield_warning(&profile.name, &scores, self.unsuitability_threshold);
        YieldEvaluation { scores, reasons, warning }
    }

    /// Fetch the crop's weather window and estimate its yield
    #[allow(clippy::too_many_arguments)]
    pub fn estimate(
        &self,
        crop: &str,
        location: Location,
        mean_ndvi: f64,
        parcel_area_ha: f64,
        window: Option<ImageryWindow>,
        today: NaiveDate,
        weather_source: &dyn WeatherSource,
    ) -> Result<YieldEstimate, WeatherError> {
        let profile = self.table.resolve(crop);
        if self.table.get(crop).is_none() {
            tracing::info!("Crop '{}' not in table; using default profile", crop);
        }

        let resolved = resolve_weather_window(profile.season, window, today, self.lookback_days);
        let weather = weather_source.observation(location, resolved.start, resolved.end)?;

        Ok(self.estimate_with_weather(profile, weather, resolved, mean_ndvi, parcel_area_ha))
    }

    /// Yield estimate from an already-fetched observation
    pub fn estimate_with_weather(
        &self,
        profile: &CropProfile,
        weather: WeatherObservation,
        window: WeatherWindow,
        mean_ndvi: f64,
        parcel_area_ha: f64,
    ) -> YieldEstimate {
        let YieldEvaluation { scores, reasons, warning } = self.evaluate(profile, &weather, mean_ndvi);

        let area = if parcel_area_ha.is_finite() { parcel_area_ha.max(0.0) } else { 0.0 };
        let estimated_yield = profile.baseline_yield * scores.overall;
        let total_yield = estimated_yield * area;

        tracing::info!(
            "Yield estimate {}: feasibility={:.4} est={:.2} t/ha total={:.2} t (weather {})",
            profile.name,
            scores.overall,
            estimated_yield,
            total_yield,
            weather.period_label()
        );
        if let Some(message) = &warning.message {
            tracing::warn!("{}", message);
        }

        YieldEstimate {
            crop: profile.name.clone(),
            baseline_yield: profile.baseline_yield,
            estimated_yield: round_to(estimated_yield, 2),
            parcel_area_ha: round_to(area, 4),
            total_yield: round_to(total_yield, 2),
            feasibility_score: scores.overall,
            confidence: YieldConfidence::from_score(scores.overall),
            is_unsuitable: warning.is_unsuitable,
            has_critical_failure: warning.has_critical_failure,
            yield_warning: warning.message,
            reasons,
            scores,
            weather,
            window,
            ideal: IdealRanges::from(profile),
        }
    }
}

impl Default for YieldFeasibilityEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(CropTable::builtin()),
            DEFAULT_LOOKBACK_DAYS,
            DEFAULT_UNSUITABILITY_THRESHOLD,
        )
    }
}

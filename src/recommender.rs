//! Crop Recommender
//!
//! Ranks every crop in the table for one location.
//!
//! One bulk weather fetch covers the whole recommendation window; each crop
//! then aggregates only the days whose month falls inside its season, which
//! is equivalent to a per-crop fetch without N round trips. Year-round crops
//! use the unsliced aggregate. If the bulk fetch fails, every crop is scored
//! against one shared trailing-lookback observation instead.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::collaborators::WeatherSource;
use crate::data::{DailyWeather, Location, WeatherObservation};
use crate::error::WeatherError;
use crate::suitability::{
    trailing_window, CropProfile, GrowingSeason, SuitabilityScores, UnsuitabilityReason,
    YieldFeasibilityEngine,
};

/// Default size of the bulk weather window
pub const DEFAULT_RECOMMENDATION_WINDOW_DAYS: u32 = 365;

/// Default number of crops returned
pub const DEFAULT_TOP_N: usize = 5;

/// One ranked crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub rank: usize,
    pub crop_key: String,
    pub crop: String,
    /// Overall suitability as a percentage (1 decimal)
    pub suitability_pct: f64,
    pub scores: SuitabilityScores,
    pub baseline_yield: f64,
    pub is_unsuitable: bool,
    pub has_critical_failure: bool,
    pub yield_warning: Option<String>,
    pub reasons: Vec<UnsuitabilityReason>,
    pub weather_period: String,
}

/// Weather basis shared by every crop in one recommendation run
enum WeatherBasis {
    /// Full window of daily samples, sliced per season
    Bulk { samples: Vec<DailyWeather>, full: WeatherObservation },
    /// One observation used for every crop
    Shared(WeatherObservation),
}

impl WeatherBasis {
    fn observation_for(&self, season: GrowingSeason) -> WeatherObservation {
        match self {
            WeatherBasis::Shared(obs) => obs.clone(),
            WeatherBasis::Bulk { full, .. } if season.is_year_round() => full.clone(),
            WeatherBasis::Bulk { samples, full } => {
                let in_season: Vec<&DailyWeather> = samples
                    .iter()
                    .filter(|s| season.contains_month(s.date.month()))
                    .collect();
                let start = in_season.first().map_or(full.period_start, |s| s.date);
                let end = in_season.last().map_or(full.period_end, |s| s.date);
                WeatherObservation::aggregate(in_season, start, end)
            }
        }
    }
}

/// Ranks crops for a location
#[derive(Debug, Clone)]
pub struct CropRecommender {
    engine: YieldFeasibilityEngine,
    window_days: u32,
}

impl CropRecommender {
    pub fn new(engine: YieldFeasibilityEngine, window_days: u32) -> Self {
        Self { engine, window_days }
    }

    /// Top `top_n` crops by overall suitability (descending)
    pub fn recommend(
        &self,
        location: Location,
        mean_ndvi: f64,
        top_n: usize,
        today: NaiveDate,
        weather_source: &dyn WeatherSource,
    ) -> Result<Vec<CropRecommendation>, WeatherError> {
        let basis = self.weather_basis(location, today, weather_source)?;
        Ok(self.rank(&basis, mean_ndvi, top_n))
    }

    fn weather_basis(
        &self,
        location: Location,
        today: NaiveDate,
        weather_source: &dyn WeatherSource,
    ) -> Result<WeatherBasis, WeatherError> {
        let year = trailing_window(today, self.window_days);
        match weather_source.daily_samples(location, year.start, year.end) {
            Ok(mut samples) => {
                samples.sort_by_key(|s| s.date);
                let full = WeatherObservation::aggregate(&samples, year.start, year.end);
                tracing::debug!(
                    "Recommendation weather: {} daily samples ({} → {})",
                    samples.len(),
                    year.start,
                    year.end
                );
                Ok(WeatherBasis::Bulk { samples, full })
            }
            Err(e) => {
                tracing::warn!("Bulk weather fetch failed ({}); using shared lookback window", e);
                let lookback = trailing_window(today, self.engine.lookback_days());
                let shared = weather_source.observation(location, lookback.start, lookback.end)?;
                Ok(WeatherBasis::Shared(shared))
            }
        }
    }

    fn rank(&self, basis: &WeatherBasis, mean_ndvi: f64, top_n: usize) -> Vec<CropRecommendation> {
        let profiles: Vec<(&str, &CropProfile)> = self.engine.table().iter().collect();

        let mut scored: Vec<CropRecommendation> = profiles
            .iter()
            .map(|(key, profile)| {
                let weather = basis.observation_for(profile.season);
                let evaluation = self.engine.evaluate(profile, &weather, mean_ndvi);
                CropRecommendation {
                    rank: 0,
                    crop_key: key.to_string(),
                    crop: profile.name.clone(),
                    suitability_pct: evaluation.scores.overall_pct(),
                    scores: evaluation.scores,
                    baseline_yield: profile.baseline_yield,
                    is_unsuitable: evaluation.warning.is_unsuitable,
                    has_critical_failure: evaluation.warning.has_critical_failure,
                    yield_warning: evaluation.warning.message,
                    reasons: evaluation.reasons,
                    weather_period: weather.period_label(),
                }
            })
            .collect();

        // Stable: ties keep table order
        scored.sort_by(|a, b| b.scores.overall.total_cmp(&a.scores.overall));
        scored.truncate(top_n);
        for (i, rec) in scored.iter_mut().enumerate() {
            rec.rank = i + 1;
        }

        tracing::info!(
            "Top crops: {}",
            scored
                .iter()
                .map(|r| format!("{} ({:.1}%)", r.crop, r.suitability_pct))
                .collect::<Vec<_>>()
                .join(", ")
        );
        scored
    }
}

impl Default for CropRecommender {
    fn default() -> Self {
        Self::new(YieldFeasibilityEngine::default(), DEFAULT_RECOMMENDATION_WINDOW_DAYS)
    }
}

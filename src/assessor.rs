//! Parcel Assessor - Main coordinator for validating land parcels
//!
//! Runs the full per-parcel pipeline:
//!
//! 1. Geometry check (processing limits)
//! 2. Remote-sensing statistics for the imagery window
//! 3. Feature extraction + cultivation classification
//! 4. Yield feasibility for the claimed crop (non-fatal)
//! 5. Crop recommendations (non-fatal)
//!
//! Each request is synchronous; `assess_batch` fans independent parcels out
//! over Rayon.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::classifier::{
    rule_based_classification, ClassificationResult, CultivationClassifier, Decision, FeatureVector,
};
use crate::collaborators::{RemoteSensing, WeatherSource};
use crate::config::EngineConfig;
use crate::data::{ImageryWindow, Location, ParcelStatistics, WeatherObservation};
use crate::error::AssessmentResult;
use crate::geometry::ParcelPolygon;
use crate::recommender::{CropRecommendation, CropRecommender};
use crate::suitability::{integrate_yield_score, trailing_window, CropTable, YieldEstimate, YieldFeasibilityEngine};
use crate::utils::round_to;

/// Square metres per international acre
pub const SQ_M_PER_ACRE: f64 = 4046.8564224;

/// Square metres per hectare
pub const SQ_M_PER_HECTARE: f64 = 10_000.0;

/// One parcel to validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub polygon: ParcelPolygon,
    /// Imagery window for the remote-sensing statistics
    pub window: ImageryWindow,
    #[serde(default)]
    pub claimed_crop: Option<String>,
    /// Overrides the configured cloud threshold
    #[serde(default)]
    pub cloud_threshold_pct: Option<u8>,
    /// Explicit weather window for the yield estimate; season logic otherwise
    #[serde(default)]
    pub weather_window: Option<ImageryWindow>,
}

/// Parcel-level validation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub decision: Decision,
    /// Classifier probability, blended with yield feasibility when a crop was claimed
    pub confidence_score: f64,
    pub agricultural_probability: f64,
    pub using_learned_model: bool,
    pub feature_importance: BTreeMap<String, f64>,
    pub plot_area_acres: f64,
    pub cropland_area_acres: f64,
    pub active_vegetation_area_acres: f64,
    pub cultivated_area_acres: f64,
    pub cultivated_percentage: f64,
    pub mean_ndvi: f64,
    pub radar_score: f64,
    pub land_classes_acres: BTreeMap<String, f64>,
    pub dominant_class: String,
    /// `[lat, lon]` ring for map previews
    pub polygon_preview: Vec<[f64; 2]>,
    pub centroid: Location,
    pub window: ImageryWindow,
    pub yield_estimate: Option<YieldEstimate>,
    pub recommended_crops: Vec<CropRecommendation>,
}

fn acres(sq_m: f64) -> f64 {
    round_to(sq_m / SQ_M_PER_ACRE, 4)
}

/// Main parcel assessor
pub struct ParcelAssessor {
    config: EngineConfig,
    classifier: CultivationClassifier,
    engine: YieldFeasibilityEngine,
    recommender: CropRecommender,
    sensing: Arc<dyn RemoteSensing>,
    weather: Arc<dyn WeatherSource>,
}

impl ParcelAssessor {
    /// Build from configuration: loads the crop table and model artifact.
    ///
    /// A broken crop table file is an error; a missing or broken model is not.
    pub fn new(
        config: EngineConfig,
        sensing: Arc<dyn RemoteSensing>,
        weather: Arc<dyn WeatherSource>,
    ) -> Result<Self> {
        let table = match &config.crop_table_path {
            Some(path) => {
                tracing::info!("Loading crop table: {:?}", path);
                CropTable::load(path)?
            }
            None => CropTable::builtin(),
        };
        let classifier = CultivationClassifier::from_artifact(config.model_path.as_deref());

        tracing::info!(
            "Parcel assessor initialized: {} crops, learned model: {}",
            table.len(),
            classifier.is_learned()
        );

        Ok(Self::with_components(config, classifier, Arc::new(table), sensing, weather))
    }

    /// Build from already-constructed parts
    pub fn with_components(
        config: EngineConfig,
        classifier: CultivationClassifier,
        table: Arc<CropTable>,
        sensing: Arc<dyn RemoteSensing>,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        let engine = YieldFeasibilityEngine::new(
            table,
            config.weather_lookback_days,
            config.unsuitability_threshold,
        );
        let recommender = CropRecommender::new(engine.clone(), config.recommendation_window_days);

        Self { config, classifier, engine, recommender, sensing, weather }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &CultivationClassifier {
        &self.classifier
    }

    /// Validate one parcel
    pub fn validate(&self, request: &ValidationRequest, today: NaiveDate) -> AssessmentResult<ValidationReport> {
        let area_sq_m = request.polygon.check_processing_limits()?;
        let cloud = request.cloud_threshold_pct.unwrap_or(self.config.cloud_threshold_pct);

        tracing::info!(
            "Validating parcel: ~{:.0} m², window {}, cloud < {}%",
            area_sq_m,
            request.window,
            cloud
        );

        let stats = self
            .sensing
            .parcel_statistics(&request.polygon, request.window, cloud)?
            .sanitized();

        Ok(self.report_from_statistics(request, &stats, today))
    }

    /// Validate many parcels in parallel; results keep request order
    pub fn assess_batch(
        &self,
        requests: &[ValidationRequest],
        today: NaiveDate,
    ) -> Vec<AssessmentResult<ValidationReport>> {
        requests
            .par_iter()
            .map(|request| self.validate(request, today))
            .collect()
    }

    /// Build the report from already-fetched statistics
    pub fn report_from_statistics(
        &self,
        request: &ValidationRequest,
        stats: &ParcelStatistics,
        today: NaiveDate,
    ) -> ValidationReport {
        let location = request.polygon.centroid();

        if stats.plot_area_sq_m <= 0.0 {
            tracing::warn!("Plot area is zero; returning REVIEW");
            return self.base_report(request, stats, location, rule_based_classification(stats));
        }

        let feature_weather = self.feature_weather(location, today);
        let features = FeatureVector::extract(stats, feature_weather.as_ref());
        let classification = self.classifier.classify(&features, stats);
        let mut report = self.base_report(request, stats, location, classification);

        let claimed = request
            .claimed_crop
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(crop) = claimed {
            let area_ha = stats.plot_area_sq_m / SQ_M_PER_HECTARE;
            match self.engine.estimate(
                crop,
                location,
                stats.mean_ndvi,
                area_ha,
                request.weather_window,
                today,
                self.weather.as_ref(),
            ) {
                Ok(estimate) => {
                    report.confidence_score =
                        integrate_yield_score(report.confidence_score, estimate.feasibility_score);
                    tracing::info!("Yield estimate: {:?}", estimate.confidence);
                    report.yield_estimate = Some(estimate);
                }
                Err(e) => tracing::warn!("Yield estimation failed (non-fatal): {}", e),
            }
        }

        match self.recommender.recommend(
            location,
            stats.mean_ndvi,
            self.config.recommendation_top_n,
            today,
            self.weather.as_ref(),
        ) {
            Ok(recs) => report.recommended_crops = recs,
            Err(e) => tracing::warn!("Crop recommendation failed (non-fatal): {}", e),
        }

        tracing::info!("Validation result: decision={}", report.decision);
        report
    }

    /// Trailing-lookback weather for the model features; `None` on failure
    fn feature_weather(&self, location: Location, today: NaiveDate) -> Option<WeatherObservation> {
        let window = trailing_window(today, self.config.weather_lookback_days);
        match self.weather.observation(location, window.start, window.end) {
            Ok(obs) => Some(obs),
            Err(e) => {
                tracing::warn!("Feature weather unavailable (non-fatal): {}", e);
                None
            }
        }
    }

    fn base_report(
        &self,
        request: &ValidationRequest,
        stats: &ParcelStatistics,
        location: Location,
        classification: ClassificationResult,
    ) -> ValidationReport {
        ValidationReport {
            decision: classification.decision,
            confidence_score: classification.agricultural_probability,
            agricultural_probability: classification.agricultural_probability,
            using_learned_model: classification.using_learned_model,
            feature_importance: classification.feature_importance,
            plot_area_acres: acres(stats.plot_area_sq_m),
            cropland_area_acres: acres(stats.cropland_area_sq_m),
            active_vegetation_area_acres: acres(stats.active_vegetation_area_sq_m),
            cultivated_area_acres: acres(stats.cultivated_area_sq_m),
            cultivated_percentage: round_to(stats.cultivated_fraction() * 100.0, 2),
            mean_ndvi: round_to(stats.mean_ndvi, 4),
            radar_score: stats.radar_score(),
            land_classes_acres: stats
                .land_classes_sq_m
                .iter()
                .map(|(class, area)| (class.clone(), acres(*area)))
                .collect(),
            dominant_class: stats.dominant_class().unwrap_or("Unknown").to_string(),
            polygon_preview: request.polygon.preview_lat_lon(),
            centroid: location,
            window: request.window,
            yield_estimate: None,
            recommended_crops: Vec::new(),
        }
    }
}

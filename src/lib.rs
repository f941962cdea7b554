//! Land Parcel Assessment Engine
//!
//! Decides whether a land parcel is actively cultivated, estimates the yield
//! of a claimed crop, ranks alternative crops and detects overlaps with
//! parcels already on record.
//!
//! - `utils/`: Range fit scoring, rounding and weight normalization
//! - `metrics/`: Radar and vegetation-health signal scorers
//! - `classifier/`: Feature extraction, boosted tree model, rule-based fallback
//! - `suitability/`: Crop table, season windows, yield feasibility
//! - `recommender`: Bulk-weather crop ranking
//! - `geometry` / `overlap` / `registry` / `registrar`: Parcel persistence and overlap alerts
//! - `assessor`: Main coordinator (single parcel + parallel batch)
//!
//! The engine performs no I/O of its own beyond loading configuration, the
//! crop table and the model artifact; remote sensing, weather and storage
//! are reached through the traits in `collaborators` and `registry`.

pub mod utils;
pub mod error;
pub mod data;
pub mod metrics;
pub mod classifier;
pub mod suitability;
pub mod collaborators;
pub mod geometry;
pub mod recommender;
pub mod overlap;
pub mod registry;
pub mod registrar;
pub mod config;
pub mod assessor;

// Re-export commonly used types
pub use assessor::{ParcelAssessor, ValidationReport, ValidationRequest, SQ_M_PER_ACRE};
pub use classifier::{ClassificationResult, CultivationClassifier, Decision, FeatureVector};
pub use collaborators::{RemoteSensing, StaticSensing, StaticWeather, WeatherSource};
pub use config::EngineConfig;
pub use data::{DailyWeather, ImageryWindow, Location, ParcelStatistics, WeatherObservation};
pub use error::{
    AssessmentError, AssessmentResult, GeometryError, ModelError, RegistryError, SensingError, WeatherError,
};
pub use geometry::ParcelPolygon;
pub use overlap::{OverlapDetector, OverlapRecord};
pub use recommender::{CropRecommendation, CropRecommender};
pub use registrar::{ConfirmPlotRequest, ConfirmPlotResponse, ParcelRegistrar};
pub use registry::{InMemoryRegistry, ParcelRegistry};
pub use suitability::{CropProfile, CropTable, YieldEstimate, YieldFeasibilityEngine};

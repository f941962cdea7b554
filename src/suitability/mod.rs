//! Crop Suitability Engine
//!
//! Compares the weather a parcel experienced against a crop's ideal growing
//! envelope and derives a yield estimate, reasons and warnings.
//!
//! ## Architecture
//! - `crop_table.rs` - CropProfile + immutable crop table (built-in Kerala set)
//! - `comparator.rs` - Per-parameter range fit and weighted overall score
//! - `advice.rs` - Unsuitability reasons and the yield warning
//! - `season.rs` - Weather window resolution (explicit / season / lookback)
//! - `assessment.rs` - YieldFeasibilityEngine and YieldEstimate

pub mod crop_table;
pub mod comparator;
pub mod advice;
pub mod season;
pub mod assessment;

// Re-export public API
pub use crop_table::{CropProfile, CropTable, GrowingSeason};
pub use comparator::{compare_conditions, soil_moisture_score, RangeFit, SuitabilityScores};
pub use advice::{
    build_yield_warning, generate_unsuitability_reasons, SuitabilityParameter, UnsuitabilityReason,
    YieldWarning,
};
pub use season::{completed_season, resolve_weather_window, trailing_window, WeatherWindow, WindowSource};
pub use assessment::{
    integrate_yield_score, IdealRanges, YieldConfidence, YieldEstimate, YieldEvaluation,
    YieldFeasibilityEngine, DEFAULT_LOOKBACK_DAYS, DEFAULT_UNSUITABILITY_THRESHOLD,
};

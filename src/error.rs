//! Error types for parcel assessment.
//!
//! Each collaborator seam has its own error enum; `AssessmentError` is what
//! the orchestration layer surfaces to callers. Model-layer failures
//! (`ModelError`) never leave the classifier.

use crate::data::ImageryWindow;

/// Result type for orchestration-level operations
pub type AssessmentResult<T> = Result<T, AssessmentError>;

/// Rejected parcel geometry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Polygon needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Vertex {index} has non-finite or out-of-range coordinates ({lon}, {lat})")]
    InvalidCoordinate { index: usize, lon: f64, lat: f64 },

    #[error("Polygon ring intersects itself (edges {first_edge} and {second_edge})")]
    SelfIntersecting { first_edge: usize, second_edge: usize },

    #[error("Polygon area must be positive")]
    NonPositiveArea,

    #[error("Polygon area is {area_sq_km:.1} km², exceeds {limit_sq_km} km² limit")]
    TooLarge { area_sq_km: f64, limit_sq_km: f64 },

    #[error("Polygon area is {area_sq_m:.1} m², too small to process")]
    TooSmall { area_sq_m: f64 },
}

/// Remote-sensing collaborator failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensingError {
    /// No usable imagery; retryable with a wider window or a looser cloud threshold
    #[error("Insufficient data for these parameters: no imagery found for {window} with cloud cover < {cloud_threshold}%")]
    NoImagery { window: ImageryWindow, cloud_threshold: u8 },

    #[error("Remote sensing service unavailable: {0}")]
    Unavailable(String),
}

/// Weather collaborator failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid weather window: {start} → {end}")]
    InvalidWindow { start: chrono::NaiveDate, end: chrono::NaiveDate },
}

/// Persistence collaborator failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Write error: {0}")]
    Write(String),
}

/// Scoring-artifact failure (load or inference)
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed model artifact: {0}")]
    Malformed(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Top-level error for the orchestration layer
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Sensing(#[from] SensingError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("This plot did not pass validation (not cultivated land). Only PASS or REVIEW plots can be saved.")]
    RejectedDecision,
}

impl AssessmentError {
    /// True when the caller may retry with different parameters
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssessmentError::Sensing(SensingError::NoImagery { .. })
                | AssessmentError::Sensing(SensingError::Unavailable(_))
                | AssessmentError::Weather(WeatherError::Unavailable(_))
        )
    }
}

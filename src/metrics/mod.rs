//! Signal scorers
//!
//! Each scorer turns one family of remote-sensing signals into a bounded
//! 0-1 score used by the classifier and the yield engine.

pub mod radar;
pub mod vegetation;

// Re-export scorer functions
pub use radar::{radar_crop_score, NEUTRAL_RADAR_SCORE};
pub use vegetation::vegetation_health_score;

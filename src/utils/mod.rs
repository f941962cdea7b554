//! Utility modules shared across scorers
//!
//! - Range fit: bounded linear-degradation score against an ideal interval
//! - Normalization: rounding, unit clamping, L1 weight normalization

pub mod range_fit;
pub mod normalization;

// Re-export commonly used functions
pub use range_fit::{range_score, range_score_with_floor, MOISTURE_FRACTION_FLOOR, PERCENT_LIKE_FLOOR};
pub use normalization::{clamp_unit, l1_normalize, round_to};

//! Advice Generation
//!
//! Turns suitability scores into human-readable reasons and a single yield
//! warning. Reasons are directional ("too cold" / "too hot") and name the
//! ideal range next to the observed value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::comparator::{RangeFit, SuitabilityScores};
use super::crop_table::CropProfile;
use crate::data::WeatherObservation;

/// Parameter scores below this get a reason
pub const REASON_THRESHOLD: f64 = 0.5;

/// Vegetation scores below this get a reason
pub const VEGETATION_REASON_THRESHOLD: f64 = 0.4;

/// Parameter scores at or below this are critical
pub const CRITICAL_THRESHOLD: f64 = 0.05;

/// Scored growing parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitabilityParameter {
    Temperature,
    Rainfall,
    Humidity,
    SoilMoisture,
    Vegetation,
}

impl SuitabilityParameter {
    pub fn display_text(&self) -> &'static str {
        match self {
            SuitabilityParameter::Temperature => "Temperature",
            SuitabilityParameter::Rainfall => "Rainfall",
            SuitabilityParameter::Humidity => "Humidity",
            SuitabilityParameter::SoilMoisture => "Soil Moisture",
            SuitabilityParameter::Vegetation => "Vegetation",
        }
    }
}

impl fmt::Display for SuitabilityParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Why a parameter scored poorly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsuitabilityReason {
    pub parameter: SuitabilityParameter,
    pub reason: String,
    pub score: f64,
}

/// Single yield warning derived from the scores
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YieldWarning {
    pub is_unsuitable: bool,
    pub has_critical_failure: bool,
    pub critical_parameters: Vec<SuitabilityParameter>,
    pub message: Option<String>,
}

/// Directional reasons for every weak parameter
pub fn generate_unsuitability_reasons(
    profile: &CropProfile,
    weather: &WeatherObservation,
    scores: &SuitabilityScores,
) -> Vec<UnsuitabilityReason> {
    let name = &profile.name;
    let mut reasons = Vec::new();

    if scores.temperature < REASON_THRESHOLD {
        let direction = match RangeFit::classify(weather.avg_temp_c, profile.temp_min_c, profile.temp_max_c) {
            RangeFit::BelowRange => "too cold",
            _ => "too hot",
        };
        reasons.push(UnsuitabilityReason {
            parameter: SuitabilityParameter::Temperature,
            reason: format!(
                "Temperature {} for {}: needs {}-{}°C, got {}°C",
                direction, name, profile.temp_min_c, profile.temp_max_c, weather.avg_temp_c
            ),
            score: scores.temperature,
        });
    }

    if scores.rainfall < REASON_THRESHOLD {
        let direction = match RangeFit::classify(
            weather.total_rainfall_mm,
            profile.rainfall_min_mm,
            profile.rainfall_max_mm,
        ) {
            RangeFit::BelowRange => "too low",
            _ => "too high",
        };
        reasons.push(UnsuitabilityReason {
            parameter: SuitabilityParameter::Rainfall,
            reason: format!(
                "Rainfall {} for {}: needs {}-{}mm, got {:.0}mm",
                direction, name, profile.rainfall_min_mm, profile.rainfall_max_mm, weather.total_rainfall_mm
            ),
            score: scores.rainfall,
        });
    }

    if scores.humidity < REASON_THRESHOLD {
        let direction = match RangeFit::classify(
            weather.avg_humidity_pct,
            profile.humidity_min_pct,
            profile.humidity_max_pct,
        ) {
            RangeFit::BelowRange => "too dry",
            _ => "too humid",
        };
        reasons.push(UnsuitabilityReason {
            parameter: SuitabilityParameter::Humidity,
            reason: format!(
                "Humidity {} for {}: needs {}-{}%, got {}%",
                direction, name, profile.humidity_min_pct, profile.humidity_max_pct, weather.avg_humidity_pct
            ),
            score: scores.humidity,
        });
    }

    if weather.has_soil_moisture() && scores.soil_moisture < REASON_THRESHOLD {
        let direction = match RangeFit::classify(weather.avg_soil_moisture, profile.soil_min, profile.soil_max) {
            RangeFit::BelowRange => "too dry",
            _ => "too wet",
        };
        reasons.push(UnsuitabilityReason {
            parameter: SuitabilityParameter::SoilMoisture,
            reason: format!(
                "Soil moisture {} for {}: needs {}-{} m³/m³, got {:.3} m³/m³",
                direction, name, profile.soil_min, profile.soil_max, weather.avg_soil_moisture
            ),
            score: scores.soil_moisture,
        });
    }

    if scores.vegetation < VEGETATION_REASON_THRESHOLD {
        reasons.push(UnsuitabilityReason {
            parameter: SuitabilityParameter::Vegetation,
            reason: "Low vegetation health: NDVI indicates poor growing conditions".to_string(),
            score: scores.vegetation,
        });
    }

    reasons
}

/// Unsuitability flag, critical parameters and the warning text
pub fn build_yield_warning(
    crop_name: &str,
    scores: &SuitabilityScores,
    unsuitability_threshold: f64,
) -> YieldWarning {
    let critical_parameters: Vec<SuitabilityParameter> = [
        (SuitabilityParameter::Temperature, scores.temperature),
        (SuitabilityParameter::Rainfall, scores.rainfall),
        (SuitabilityParameter::Humidity, scores.humidity),
        (SuitabilityParameter::SoilMoisture, scores.soil_moisture),
    ]
    .into_iter()
    .filter(|(_, score)| *score <= CRITICAL_THRESHOLD)
    .map(|(param, _)| param)
    .collect();

    let is_unsuitable = scores.overall < unsuitability_threshold;
    let has_critical_failure = !critical_parameters.is_empty();

    let message = if is_unsuitable {
        Some(format!(
            "{} is NOT RECOMMENDED for this region: overall suitability only {:.0}%",
            crop_name,
            scores.overall * 100.0
        ))
    } else if has_critical_failure {
        let names: Vec<&str> = critical_parameters.iter().map(|p| p.display_text()).collect();
        Some(format!(
            "{} will have POOR YIELD here: {} critically low",
            crop_name,
            names.join(", ")
        ))
    } else {
        None
    };

    YieldWarning { is_unsuitable, has_critical_failure, critical_parameters, message }
}

//! Engine configuration
//!
//! Loaded once from JSON; every field has a default so a partial file (or no
//! file) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::overlap::DEFAULT_OVERLAP_THRESHOLD;
use crate::recommender::{DEFAULT_RECOMMENDATION_WINDOW_DAYS, DEFAULT_TOP_N};
use crate::suitability::{DEFAULT_LOOKBACK_DAYS, DEFAULT_UNSUITABILITY_THRESHOLD};

/// Default maximum cloud cover for optical imagery (%)
pub const DEFAULT_CLOUD_THRESHOLD_PCT: u8 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trailing weather window for year-round crops
    pub weather_lookback_days: u32,
    /// Bulk weather window for recommendations
    pub recommendation_window_days: u32,
    pub recommendation_top_n: usize,
    pub overlap_threshold: f64,
    pub unsuitability_threshold: f64,
    pub cloud_threshold_pct: u8,
    /// Boosted tree artifact; rule-based fallback when absent
    pub model_path: Option<PathBuf>,
    /// Crop table JSON; built-in table when absent
    pub crop_table_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weather_lookback_days: DEFAULT_LOOKBACK_DAYS,
            recommendation_window_days: DEFAULT_RECOMMENDATION_WINDOW_DAYS,
            recommendation_top_n: DEFAULT_TOP_N,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            unsuitability_threshold: DEFAULT_UNSUITABILITY_THRESHOLD,
            cloud_threshold_pct: DEFAULT_CLOUD_THRESHOLD_PCT,
            model_path: None,
            crop_table_path: None,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            anyhow::bail!("overlap_threshold must be within [0, 1], got {}", self.overlap_threshold);
        }
        if !(0.0..=1.0).contains(&self.unsuitability_threshold) {
            anyhow::bail!(
                "unsuitability_threshold must be within [0, 1], got {}",
                self.unsuitability_threshold
            );
        }
        if self.cloud_threshold_pct > 100 {
            anyhow::bail!("cloud_threshold_pct must be ≤ 100, got {}", self.cloud_threshold_pct);
        }
        if self.weather_lookback_days == 0 || self.recommendation_window_days == 0 {
            anyhow::bail!("weather windows must be at least one day");
        }
        Ok(())
    }
}

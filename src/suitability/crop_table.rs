//! Crop Reference Table
//!
//! Ideal growing envelopes per crop (Kerala region). Built once at startup,
//! either from the built-in table or a JSON file, and read-only afterwards.
//!
//! Sources for the built-in values: Kerala Dept. of Agriculture statistics
//! (2023-24), Kerala Agricultural University recommendations, ICAR / Spices
//! Board guidelines and the FAO Ecocrop database. Rainfall is the total over
//! the scored window.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Calendar months a crop is actively grown (inclusive).
///
/// `start_month > end_month` means the season wraps the year boundary
/// (e.g. Nov → Feb). `1..=12` is the year-round sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowingSeason {
    pub start_month: u32,
    pub end_month: u32,
}

impl GrowingSeason {
    pub const YEAR_ROUND: GrowingSeason = GrowingSeason { start_month: 1, end_month: 12 };

    pub fn new(start_month: u32, end_month: u32) -> Option<Self> {
        if (1..=12).contains(&start_month) && (1..=12).contains(&end_month) {
            Some(Self { start_month, end_month })
        } else {
            None
        }
    }

    pub fn is_year_round(&self) -> bool {
        *self == Self::YEAR_ROUND
    }

    pub fn wraps_year_end(&self) -> bool {
        self.start_month > self.end_month
    }

    /// Whether a calendar month falls inside the season
    pub fn contains_month(&self, month: u32) -> bool {
        if self.wraps_year_end() {
            month >= self.start_month || month <= self.end_month
        } else {
            self.start_month <= month && month <= self.end_month
        }
    }
}

impl Default for GrowingSeason {
    fn default() -> Self {
        Self::YEAR_ROUND
    }
}

/// Ideal growing conditions for a crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: String,
    /// tons / hectare (state average)
    pub baseline_yield: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub rainfall_min_mm: f64,
    pub rainfall_max_mm: f64,
    pub humidity_min_pct: f64,
    pub humidity_max_pct: f64,
    /// Volumetric soil moisture (m³/m³)
    #[serde(default = "default_soil_min")]
    pub soil_min: f64,
    #[serde(default = "default_soil_max")]
    pub soil_max: f64,
    #[serde(default)]
    pub season: GrowingSeason,
}

fn default_soil_min() -> f64 {
    0.15
}

fn default_soil_max() -> f64 {
    0.40
}

impl CropProfile {
    #[allow(clippy::too_many_arguments)]
    fn row(
        name: &str,
        baseline_yield: f64,
        temp: (f64, f64),
        rainfall: (f64, f64),
        humidity: (f64, f64),
        soil: (f64, f64),
        season: (u32, u32),
    ) -> Self {
        Self {
            name: name.to_string(),
            baseline_yield,
            temp_min_c: temp.0,
            temp_max_c: temp.1,
            rainfall_min_mm: rainfall.0,
            rainfall_max_mm: rainfall.1,
            humidity_min_pct: humidity.0,
            humidity_max_pct: humidity.1,
            soil_min: soil.0,
            soil_max: soil.1,
            season: GrowingSeason { start_month: season.0, end_month: season.1 },
        }
    }

    /// Profile used for crops missing from the table
    pub fn unknown() -> Self {
        Self::row("Unknown", 2.5, (22.0, 32.0), (250.0, 575.0), (60.0, 85.0), (0.15, 0.40), (1, 12))
    }
}

/// One entry in a crop table file
#[derive(Debug, Deserialize)]
struct CropTableEntry {
    key: String,
    #[serde(flatten)]
    profile: CropProfile,
}

/// Immutable crop key → profile table (keys are lowercase)
#[derive(Debug, Clone)]
pub struct CropTable {
    entries: Vec<(String, CropProfile)>,
    index: FxHashMap<String, usize>,
    unknown: CropProfile,
}

impl CropTable {
    fn from_entries(entries: Vec<(String, CropProfile)>) -> Self {
        let entries: Vec<(String, CropProfile)> = entries
            .into_iter()
            .map(|(k, p)| (normalize_key(&k), p))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
        Self { entries, index, unknown: CropProfile::unknown() }
    }

    /// Built-in Kerala table
    pub fn builtin() -> Self {
        let rows = vec![
            // Food crops
            ("rice", CropProfile::row("Rice", 2.96, (20.0, 35.0), (1500.0, 3000.0), (70.0, 90.0), (0.30, 0.50), (6, 10))),
            ("tapioca", CropProfile::row("Tapioca", 25.0, (25.0, 30.0), (1000.0, 2000.0), (60.0, 85.0), (0.15, 0.35), (1, 12))),
            ("banana", CropProfile::row("Banana", 18.0, (15.0, 35.0), (1200.0, 2500.0), (65.0, 90.0), (0.20, 0.40), (1, 12))),
            ("maize", CropProfile::row("Maize", 2.5, (18.0, 27.0), (500.0, 1000.0), (55.0, 80.0), (0.15, 0.35), (6, 9))),
            // Plantation crops
            ("coconut", CropProfile::row("Coconut", 6.0, (27.0, 32.0), (1500.0, 2500.0), (80.0, 90.0), (0.20, 0.40), (1, 12))),
            ("rubber", CropProfile::row("Rubber", 1.63, (25.0, 34.0), (2000.0, 4000.0), (75.0, 95.0), (0.20, 0.45), (1, 12))),
            ("tea", CropProfile::row("Tea", 2.0, (13.0, 30.0), (1500.0, 3000.0), (70.0, 90.0), (0.25, 0.45), (1, 12))),
            ("coffee", CropProfile::row("Coffee", 1.05, (20.0, 30.0), (1500.0, 2500.0), (70.0, 90.0), (0.20, 0.40), (1, 12))),
            ("arecanut", CropProfile::row("Arecanut", 1.5, (14.0, 36.0), (1500.0, 5000.0), (70.0, 90.0), (0.20, 0.40), (1, 12))),
            ("cashew", CropProfile::row("Cashew", 0.8, (20.0, 35.0), (1000.0, 2000.0), (60.0, 80.0), (0.10, 0.30), (11, 3))),
            // Spices
            ("pepper", CropProfile::row("Pepper", 0.40, (20.0, 30.0), (2000.0, 3000.0), (75.0, 90.0), (0.25, 0.45), (1, 12))),
            ("cardamom", CropProfile::row("Cardamom", 0.20, (15.0, 25.0), (1500.0, 4000.0), (75.0, 90.0), (0.30, 0.50), (1, 12))),
            ("ginger", CropProfile::row("Ginger", 20.0, (19.0, 30.0), (1500.0, 3000.0), (70.0, 90.0), (0.25, 0.40), (5, 12))),
            ("turmeric", CropProfile::row("Turmeric", 25.0, (20.0, 35.0), (1500.0, 2500.0), (70.0, 90.0), (0.25, 0.40), (5, 1))),
            ("nutmeg", CropProfile::row("Nutmeg", 0.35, (20.0, 30.0), (1500.0, 2500.0), (75.0, 90.0), (0.25, 0.45), (1, 12))),
            ("clove", CropProfile::row("Clove", 0.25, (20.0, 30.0), (1500.0, 2500.0), (75.0, 90.0), (0.25, 0.45), (1, 12))),
            ("vanilla", CropProfile::row("Vanilla", 0.30, (21.0, 32.0), (1500.0, 3000.0), (75.0, 90.0), (0.25, 0.40), (1, 12))),
            ("cinnamon", CropProfile::row("Cinnamon", 0.40, (20.0, 30.0), (1500.0, 2500.0), (75.0, 90.0), (0.25, 0.40), (1, 12))),
            // Others
            ("sugarcane", CropProfile::row("Sugarcane", 55.0, (20.0, 35.0), (1500.0, 2500.0), (70.0, 85.0), (0.25, 0.45), (1, 12))),
            ("groundnut", CropProfile::row("Groundnut", 1.3, (25.0, 30.0), (500.0, 1000.0), (50.0, 70.0), (0.10, 0.25), (12, 3))),
        ];

        Self::from_entries(rows.into_iter().map(|(k, p)| (k.to_string(), p)).collect())
    }

    /// Load a table from a JSON array of `{ "key": ..., <profile fields> }`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crop table: {:?}", path))?;

        let entries: Vec<CropTableEntry> = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse crop table JSON")?;

        if entries.is_empty() {
            anyhow::bail!("Crop table {:?} has no entries", path);
        }
        for entry in &entries {
            let season = entry.profile.season;
            if GrowingSeason::new(season.start_month, season.end_month).is_none() {
                anyhow::bail!("Crop '{}' has an invalid season {:?}", entry.key, season);
            }
        }

        Ok(Self::from_entries(
            entries.into_iter().map(|e| (e.key, e.profile)).collect(),
        ))
    }

    /// Exact lookup (case-insensitive, trimmed)
    pub fn get(&self, crop: &str) -> Option<&CropProfile> {
        self.index.get(&normalize_key(crop)).map(|&i| &self.entries[i].1)
    }

    /// Lookup falling back to the "Unknown" profile
    pub fn resolve(&self, crop: &str) -> &CropProfile {
        self.get(crop).unwrap_or(&self.unknown)
    }

    /// Profiles in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CropProfile)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

//! Parcel Registry
//!
//! Persistence seam for farmers, confirmed plots and overlap alerts.
//!
//! - `ParcelRegistry`: the trait the registrar and overlap detector use
//! - `InMemoryRegistry`: thread-safe in-memory implementation for local
//!   runs and tests
//!
//! Reads of existing plots and alert writes are not transactional; two
//! parcels confirmed concurrently can miss each other's overlap. Strict
//! consistency belongs to the backing store.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::classifier::Decision;
use crate::error::RegistryError;
use crate::geometry::ParcelPolygon;

/// Registered farmer (unique by phone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Plot to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlot {
    pub farmer_id: String,
    pub label: Option<String>,
    pub polygon: ParcelPolygon,
    pub claimed_crop: Option<String>,
    pub area_acres: f64,
    pub effective_area_acres: f64,
    pub ndvi_mean: f64,
    pub decision: Decision,
    pub confidence_score: f64,
}

/// Stored plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    pub id: String,
    #[serde(flatten)]
    pub plot: NewPlot,
    pub created_at: DateTime<Utc>,
}

/// Existing plot with owner metadata, as read by the overlap detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlot {
    pub plot_id: String,
    pub label: Option<String>,
    pub farmer_id: String,
    pub farmer_name: String,
    pub farmer_phone: String,
    pub polygon: ParcelPolygon,
}

/// Alert to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOverlapAlert {
    pub new_plot_id: String,
    pub existing_plot_id: String,
    pub overlap_fraction: f64,
}

/// Stored overlap alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapAlert {
    pub id: String,
    pub new_plot_id: String,
    pub existing_plot_id: String,
    pub overlap_fraction: f64,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// Persistence operations used by the engine
pub trait ParcelRegistry: Send + Sync {
    /// Insert a farmer, or return the existing one with the same phone unchanged
    fn upsert_farmer(&self, name: &str, phone: &str, email: Option<&str>) -> Result<Farmer, RegistryError>;

    fn insert_plot(&self, plot: NewPlot) -> Result<PlotRecord, RegistryError>;

    /// All stored plots with owner metadata
    fn existing_plots(&self) -> Result<Vec<StoredPlot>, RegistryError>;

    fn insert_alert(&self, alert: NewOverlapAlert) -> Result<OverlapAlert, RegistryError>;

    /// Alerts filtered by resolved flag, newest first
    fn list_alerts(&self, resolved: bool) -> Result<Vec<OverlapAlert>, RegistryError>;

    fn resolve_alert(&self, alert_id: &str) -> Result<OverlapAlert, RegistryError>;
}

/// In-memory registry
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    data: Arc<RwLock<RegistryData>>,
}

#[derive(Default)]
struct RegistryData {
    farmers: Vec<Farmer>,
    farmer_by_phone: FxHashMap<String, usize>,
    plots: Vec<PlotRecord>,
    alerts: Vec<OverlapAlert>,
    next_id: u64,
    // Simulated alert-store outage
    reject_alert_writes: bool,
}

impl RegistryData {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:06}", prefix, self.next_id)
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `insert_alert` fail (for exercising the non-blocking path)
    pub fn set_reject_alert_writes(&self, reject: bool) {
        if let Ok(mut data) = self.data.write() {
            data.reject_alert_writes = reject;
        }
    }

    pub fn plot_count(&self) -> usize {
        self.data.read().map(|d| d.plots.len()).unwrap_or(0)
    }

    pub fn farmer_count(&self) -> usize {
        self.data.read().map(|d| d.farmers.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryData>, RegistryError> {
        self.data
            .read()
            .map_err(|e| RegistryError::Read(format!("registry lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryData>, RegistryError> {
        self.data
            .write()
            .map_err(|e| RegistryError::Write(format!("registry lock poisoned: {}", e)))
    }
}

impl ParcelRegistry for InMemoryRegistry {
    fn upsert_farmer(&self, name: &str, phone: &str, email: Option<&str>) -> Result<Farmer, RegistryError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(RegistryError::Write("farmer phone is required".into()));
        }

        let mut data = self.write()?;
        if let Some(&i) = data.farmer_by_phone.get(phone) {
            return Ok(data.farmers[i].clone());
        }

        let farmer = Farmer {
            id: data.next_id("farmer"),
            name: name.trim().to_string(),
            phone: phone.to_string(),
            email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            created_at: Utc::now(),
        };
        let index = data.farmers.len();
        data.farmers.push(farmer.clone());
        data.farmer_by_phone.insert(phone.to_string(), index);

        tracing::info!("Registered farmer {} ({})", farmer.id, farmer.name);
        Ok(farmer)
    }

    fn insert_plot(&self, plot: NewPlot) -> Result<PlotRecord, RegistryError> {
        let mut data = self.write()?;
        if !data.farmers.iter().any(|f| f.id == plot.farmer_id) {
            return Err(RegistryError::NotFound(format!("farmer {}", plot.farmer_id)));
        }

        let record = PlotRecord { id: data.next_id("plot"), plot, created_at: Utc::now() };
        data.plots.push(record.clone());
        Ok(record)
    }

    fn existing_plots(&self) -> Result<Vec<StoredPlot>, RegistryError> {
        let data = self.read()?;
        let farmers: FxHashMap<&str, &Farmer> = data.farmers.iter().map(|f| (f.id.as_str(), f)).collect();

        Ok(data
            .plots
            .iter()
            .map(|record| {
                let owner = farmers.get(record.plot.farmer_id.as_str());
                StoredPlot {
                    plot_id: record.id.clone(),
                    label: record.plot.label.clone(),
                    farmer_id: record.plot.farmer_id.clone(),
                    farmer_name: owner.map(|f| f.name.clone()).unwrap_or_default(),
                    farmer_phone: owner.map(|f| f.phone.clone()).unwrap_or_default(),
                    polygon: record.plot.polygon.clone(),
                }
            })
            .collect())
    }

    fn insert_alert(&self, alert: NewOverlapAlert) -> Result<OverlapAlert, RegistryError> {
        let mut data = self.write()?;
        if data.reject_alert_writes {
            return Err(RegistryError::Write("alert store unavailable".into()));
        }

        let stored = OverlapAlert {
            id: data.next_id("alert"),
            new_plot_id: alert.new_plot_id,
            existing_plot_id: alert.existing_plot_id,
            overlap_fraction: alert.overlap_fraction,
            resolved: false,
            created_at: Utc::now(),
        };
        data.alerts.push(stored.clone());
        Ok(stored)
    }

    fn list_alerts(&self, resolved: bool) -> Result<Vec<OverlapAlert>, RegistryError> {
        let data = self.read()?;
        Ok(data
            .alerts
            .iter()
            .rev()
            .filter(|a| a.resolved == resolved)
            .cloned()
            .collect())
    }

    fn resolve_alert(&self, alert_id: &str) -> Result<OverlapAlert, RegistryError> {
        let mut data = self.write()?;
        let alert = data
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| RegistryError::NotFound(format!("alert {}", alert_id)))?;
        alert.resolved = true;
        Ok(alert.clone())
    }
}

//! Overlap Detection
//!
//! Finds stored plots that cover a significant share of a candidate parcel:
//!
//!   overlap_fraction = area(candidate ∩ existing) / area(candidate)
//!
//! Entries at or above the threshold are reported and each one raises an
//! alert in the registry. A failed alert write is logged and the entry is
//! still returned with `alert_created = false`.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::geometry::ParcelPolygon;
use crate::registry::{NewOverlapAlert, ParcelRegistry, StoredPlot};
use crate::utils::round_to;

/// Default minimum overlap fraction to report
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.30;

/// One significant overlap with an existing plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapRecord {
    pub existing_plot_id: String,
    pub existing_plot_label: Option<String>,
    pub existing_farmer_id: String,
    pub existing_farmer_name: String,
    pub existing_farmer_phone: String,
    /// Fraction of the candidate's area (4 decimals)
    pub overlap_fraction: f64,
    pub alert_created: bool,
}

impl OverlapRecord {
    pub fn overlap_pct(&self) -> f64 {
        round_to(self.overlap_fraction * 100.0, 2)
    }
}

/// Overlap detector with a fixed reporting threshold
#[derive(Debug, Clone, Copy)]
pub struct OverlapDetector {
    threshold: f64,
}

impl OverlapDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Pure comparison against a list of plots; no alerts are written
    pub fn find_overlaps(
        &self,
        candidate: &ParcelPolygon,
        existing: &[StoredPlot],
        exclude_plot_id: Option<&str>,
    ) -> Vec<OverlapRecord> {
        let candidate_area = candidate.planar_area();
        if candidate_area <= 0.0 || !candidate_area.is_finite() {
            return Vec::new();
        }

        existing
            .iter()
            .filter(|plot| Some(plot.plot_id.as_str()) != exclude_plot_id)
            .filter_map(|plot| {
                let fraction = candidate.intersection_area(&plot.polygon) / candidate_area;
                if !fraction.is_finite() || fraction < self.threshold {
                    return None;
                }
                Some(OverlapRecord {
                    existing_plot_id: plot.plot_id.clone(),
                    existing_plot_label: plot.label.clone(),
                    existing_farmer_id: plot.farmer_id.clone(),
                    existing_farmer_name: plot.farmer_name.clone(),
                    existing_farmer_phone: plot.farmer_phone.clone(),
                    overlap_fraction: round_to(fraction.min(1.0), 4),
                    alert_created: false,
                })
            })
            .collect()
    }

    /// Compare a candidate against every stored plot and raise alerts.
    ///
    /// Alerts are only written when the candidate itself has a plot id.
    pub fn check(
        &self,
        candidate: &ParcelPolygon,
        candidate_plot_id: Option<&str>,
        registry: &dyn ParcelRegistry,
    ) -> Result<Vec<OverlapRecord>, RegistryError> {
        let existing = registry.existing_plots()?;
        let mut overlaps = self.find_overlaps(candidate, &existing, candidate_plot_id);

        if let Some(new_plot_id) = candidate_plot_id {
            for overlap in &mut overlaps {
                let alert = NewOverlapAlert {
                    new_plot_id: new_plot_id.to_string(),
                    existing_plot_id: overlap.existing_plot_id.clone(),
                    overlap_fraction: overlap.overlap_fraction,
                };
                match registry.insert_alert(alert) {
                    Ok(_) => overlap.alert_created = true,
                    Err(e) => tracing::warn!(
                        "Failed to create overlap alert {} → {}: {}",
                        new_plot_id,
                        overlap.existing_plot_id,
                        e
                    ),
                }
            }
        }

        if !overlaps.is_empty() {
            tracing::info!(
                "Overlap detected: {} existing plot(s) cover ≥ {:.0}% of the candidate",
                overlaps.len(),
                self.threshold * 100.0
            );
        }
        Ok(overlaps)
    }
}

impl Default for OverlapDetector {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::square;
    use crate::registry::InMemoryRegistry;

    fn stored(id: &str, polygon: ParcelPolygon) -> StoredPlot {
        StoredPlot {
            plot_id: id.to_string(),
            label: None,
            farmer_id: "farmer-1".into(),
            farmer_name: "Anil".into(),
            farmer_phone: "900".into(),
            polygon,
        }
    }

    #[test]
    fn test_identical_polygons_full_overlap() {
        let detector = OverlapDetector::default();
        let p = square(76.0, 10.0, 0.01);
        let overlaps = detector.find_overlaps(&p, &[stored("plot-1", p.clone())], None);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].overlap_fraction, 1.0);
        assert_eq!(overlaps[0].overlap_pct(), 100.0);
    }

    #[test]
    fn test_disjoint_polygons_no_entries() {
        let detector = OverlapDetector::default();
        let overlaps = detector.find_overlaps(
            &square(76.0, 10.0, 0.01),
            &[stored("plot-1", square(77.0, 11.0, 0.01))],
            None,
        );
        assert!(overlaps.is_empty());
    }

    #[test]
    fn test_below_threshold_excluded() {
        let detector = OverlapDetector::default();
        // 20% overlap along the x axis
        let overlaps = detector.find_overlaps(
            &square(76.0, 10.0, 0.01),
            &[stored("plot-1", square(76.008, 10.0, 0.01))],
            None,
        );
        assert!(overlaps.is_empty());
    }

    #[test]
    fn test_own_record_excluded() {
        let detector = OverlapDetector::default();
        let p = square(76.0, 10.0, 0.01);
        let overlaps = detector.find_overlaps(&p, &[stored("plot-7", p.clone())], Some("plot-7"));
        assert!(overlaps.is_empty());
    }

    #[test]
    fn test_zero_area_candidate_short_circuits() {
        let detector = OverlapDetector::default();
        let line = ParcelPolygon::new(&[[76.0, 10.0], [76.01, 10.0], [76.02, 10.0]]).unwrap();
        let overlaps = detector.find_overlaps(&line, &[stored("plot-1", square(76.0, 10.0, 0.05))], None);
        assert!(overlaps.is_empty());
    }

    #[test]
    fn test_check_creates_alerts() {
        let registry = InMemoryRegistry::new();
        let farmer = registry.upsert_farmer("Anil", "900", None).unwrap();
        let existing = registry
            .insert_plot(crate::registry::NewPlot {
                farmer_id: farmer.id.clone(),
                label: Some("East".into()),
                polygon: square(76.0, 10.0, 0.01),
                claimed_crop: None,
                area_acres: 1.0,
                effective_area_acres: 1.0,
                ndvi_mean: 0.6,
                decision: crate::classifier::Decision::Pass,
                confidence_score: 0.8,
            })
            .unwrap();

        let detector = OverlapDetector::default();
        let overlaps = detector.check(&square(76.0, 10.0, 0.01), Some("plot-new"), &registry).unwrap();
        assert_eq!(overlaps.len(), 1);
        assert!(overlaps[0].alert_created);
        assert_eq!(overlaps[0].existing_plot_id, existing.id);
        assert_eq!(overlaps[0].existing_plot_label.as_deref(), Some("East"));

        let alerts = registry.list_alerts(false).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].new_plot_id, "plot-new");
    }

    #[test]
    fn test_alert_failure_keeps_entry() {
        let registry = InMemoryRegistry::new();
        let farmer = registry.upsert_farmer("Anil", "900", None).unwrap();
        registry
            .insert_plot(crate::registry::NewPlot {
                farmer_id: farmer.id,
                label: None,
                polygon: square(76.0, 10.0, 0.01),
                claimed_crop: None,
                area_acres: 1.0,
                effective_area_acres: 1.0,
                ndvi_mean: 0.6,
                decision: crate::classifier::Decision::Review,
                confidence_score: 0.5,
            })
            .unwrap();
        registry.set_reject_alert_writes(true);

        let overlaps = OverlapDetector::default()
            .check(&square(76.0, 10.0, 0.01), Some("plot-new"), &registry)
            .unwrap();
        assert_eq!(overlaps.len(), 1);
        assert!(!overlaps[0].alert_created);
        assert!(registry.list_alerts(false).unwrap().is_empty());
    }

    #[test]
    fn test_check_without_plot_id_writes_no_alerts() {
        let registry = InMemoryRegistry::new();
        let overlaps = OverlapDetector::default()
            .check(&square(76.0, 10.0, 0.01), None, &registry)
            .unwrap();
        assert!(overlaps.is_empty());
    }
}

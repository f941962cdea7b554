//! Parcel Registrar
//!
//! Confirm flow for a validated parcel: register the farmer, store the plot
//! with its effective cultivated area, then check it against every other
//! stored plot. Also exposes alert administration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::classifier::Decision;
use crate::error::{AssessmentError, AssessmentResult, RegistryError};
use crate::geometry::ParcelPolygon;
use crate::overlap::{OverlapDetector, OverlapRecord};
use crate::registry::{NewPlot, OverlapAlert, ParcelRegistry};
use crate::utils::round_to;

/// Farmer's confirmation of a validated parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPlotRequest {
    pub farmer_name: String,
    pub farmer_phone: String,
    #[serde(default)]
    pub farmer_email: Option<String>,
    pub polygon: ParcelPolygon,
    #[serde(default)]
    pub plot_label: Option<String>,
    #[serde(default)]
    pub claimed_crop: Option<String>,
    pub area_acres: f64,
    /// 0-100; values outside are clamped
    pub cultivated_percentage: f64,
    pub ndvi_mean: f64,
    pub decision: Decision,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPlotResponse {
    pub farmer_id: String,
    pub plot_id: String,
    pub effective_area_acres: f64,
    pub message: String,
    pub overlaps: Vec<OverlapRecord>,
    pub has_overlap_warning: bool,
}

/// Effective cultivated area: `area × clamp(pct, 0, 100) / 100` (4 decimals)
pub fn effective_area_acres(area_acres: f64, cultivated_percentage: f64) -> f64 {
    let pct = if cultivated_percentage.is_finite() { cultivated_percentage.clamp(0.0, 100.0) } else { 0.0 };
    round_to(area_acres * pct / 100.0, 4)
}

pub struct ParcelRegistrar {
    registry: Arc<dyn ParcelRegistry>,
    detector: OverlapDetector,
}

impl ParcelRegistrar {
    pub fn new(registry: Arc<dyn ParcelRegistry>, detector: OverlapDetector) -> Self {
        Self { registry, detector }
    }

    /// Save a PASS or REVIEW parcel and report overlaps.
    ///
    /// Errors before the plot is inserted are returned. Once it is stored,
    /// an overlap-check failure is logged and the response carries no
    /// overlaps.
    pub fn confirm(&self, request: ConfirmPlotRequest) -> AssessmentResult<ConfirmPlotResponse> {
        if request.decision == Decision::Fail {
            return Err(AssessmentError::RejectedDecision);
        }

        let farmer = self.registry.upsert_farmer(
            &request.farmer_name,
            &request.farmer_phone,
            request.farmer_email.as_deref(),
        )?;

        let effective_area = effective_area_acres(request.area_acres, request.cultivated_percentage);
        tracing::info!(
            "Area adjustment: {:.2} acres × {:.1}% cultivated = {:.4} effective acres",
            request.area_acres,
            request.cultivated_percentage.clamp(0.0, 100.0),
            effective_area
        );

        let polygon = request.polygon.clone();
        let plot = self.registry.insert_plot(NewPlot {
            farmer_id: farmer.id.clone(),
            label: request.plot_label,
            polygon: request.polygon,
            claimed_crop: request.claimed_crop,
            area_acres: request.area_acres,
            effective_area_acres: effective_area,
            ndvi_mean: request.ndvi_mean,
            decision: request.decision,
            confidence_score: request.confidence_score,
        })?;

        // Plot is stored; overlap failures are non-fatal from here
        let (overlaps, message) = match self.detector.check(&polygon, Some(plot.id.as_str()), self.registry.as_ref()) {
            Ok(overlaps) if overlaps.is_empty() => (overlaps, "Plot saved successfully!".to_string()),
            Ok(overlaps) => {
                let message = format!(
                    "Plot saved with {} overlap(s) detected. Admin has been alerted.",
                    overlaps.len()
                );
                (overlaps, message)
            }
            Err(e) => {
                tracing::warn!("Overlap check failed for {} (plot kept): {}", plot.id, e);
                (Vec::new(), "Plot saved. Overlap check could not be completed.".to_string())
            }
        };
        let has_overlap_warning = !overlaps.is_empty();

        Ok(ConfirmPlotResponse {
            farmer_id: farmer.id,
            plot_id: plot.id,
            effective_area_acres: effective_area,
            message,
            overlaps,
            has_overlap_warning,
        })
    }

    /// Alerts by resolved flag
    pub fn alerts(&self, resolved: bool) -> Result<Vec<OverlapAlert>, RegistryError> {
        self.registry.list_alerts(resolved)
    }

    pub fn resolve_alert(&self, alert_id: &str) -> Result<OverlapAlert, RegistryError> {
        self.registry.resolve_alert(alert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::square;
    use crate::registry::{Farmer, InMemoryRegistry, NewOverlapAlert, PlotRecord, StoredPlot};

    fn request(phone: &str, polygon: ParcelPolygon, decision: Decision) -> ConfirmPlotRequest {
        ConfirmPlotRequest {
            farmer_name: "Anil".into(),
            farmer_phone: phone.into(),
            farmer_email: None,
            polygon,
            plot_label: Some("Paddy".into()),
            claimed_crop: Some("rice".into()),
            area_acres: 10.0,
            cultivated_percentage: 70.0,
            ndvi_mean: 0.7,
            decision,
            confidence_score: 0.85,
        }
    }

    #[test]
    fn test_effective_area() {
        assert_eq!(effective_area_acres(10.0, 70.0), 7.0);
        assert_eq!(effective_area_acres(10.0, 140.0), 10.0);
        assert_eq!(effective_area_acres(10.0, -5.0), 0.0);
    }

    #[test]
    fn test_fail_decision_rejected() {
        let registry = Arc::new(InMemoryRegistry::new());
        let registrar = ParcelRegistrar::new(registry.clone(), OverlapDetector::default());
        let result = registrar.confirm(request("900", square(76.0, 10.0, 0.01), Decision::Fail));
        assert!(matches!(result, Err(AssessmentError::RejectedDecision)));
        assert_eq!(registry.plot_count(), 0);
    }

    #[test]
    fn test_first_plot_has_no_overlap() {
        let registrar = ParcelRegistrar::new(Arc::new(InMemoryRegistry::new()), OverlapDetector::default());
        let response = registrar.confirm(request("900", square(76.0, 10.0, 0.01), Decision::Pass)).unwrap();
        assert!(!response.has_overlap_warning);
        assert_eq!(response.effective_area_acres, 7.0);
        assert_eq!(response.message, "Plot saved successfully!");
    }

    /// Registry whose plot listing is down
    struct UnreadableRegistry {
        inner: InMemoryRegistry,
    }

    impl ParcelRegistry for UnreadableRegistry {
        fn upsert_farmer(&self, name: &str, phone: &str, email: Option<&str>) -> Result<Farmer, RegistryError> {
            self.inner.upsert_farmer(name, phone, email)
        }

        fn insert_plot(&self, plot: NewPlot) -> Result<PlotRecord, RegistryError> {
            self.inner.insert_plot(plot)
        }

        fn existing_plots(&self) -> Result<Vec<StoredPlot>, RegistryError> {
            Err(RegistryError::Read("plots table offline".into()))
        }

        fn insert_alert(&self, alert: NewOverlapAlert) -> Result<OverlapAlert, RegistryError> {
            self.inner.insert_alert(alert)
        }

        fn list_alerts(&self, resolved: bool) -> Result<Vec<OverlapAlert>, RegistryError> {
            self.inner.list_alerts(resolved)
        }

        fn resolve_alert(&self, alert_id: &str) -> Result<OverlapAlert, RegistryError> {
            self.inner.resolve_alert(alert_id)
        }
    }

    #[test]
    fn test_overlap_read_failure_keeps_saved_plot() {
        let registry = Arc::new(UnreadableRegistry { inner: InMemoryRegistry::new() });
        let registrar = ParcelRegistrar::new(registry.clone(), OverlapDetector::default());

        let response = registrar.confirm(request("900", square(76.0, 10.0, 0.01), Decision::Pass)).unwrap();
        assert_eq!(registry.inner.plot_count(), 1);
        assert!(!response.plot_id.is_empty());
        assert!(response.overlaps.is_empty());
        assert!(!response.has_overlap_warning);
        assert_eq!(response.message, "Plot saved. Overlap check could not be completed.");
    }

    #[test]
    fn test_second_plot_overlaps_first() {
        let registrar = ParcelRegistrar::new(Arc::new(InMemoryRegistry::new()), OverlapDetector::default());
        let first = registrar.confirm(request("900", square(76.0, 10.0, 0.01), Decision::Pass)).unwrap();
        let second = registrar.confirm(request("901", square(76.0, 10.0, 0.01), Decision::Review)).unwrap();

        assert_ne!(first.farmer_id, second.farmer_id);
        assert!(second.has_overlap_warning);
        assert_eq!(second.overlaps.len(), 1);
        assert_eq!(second.overlaps[0].existing_plot_id, first.plot_id);
        assert_eq!(second.overlaps[0].existing_farmer_phone, "900");
        assert!(second.overlaps[0].alert_created);

        let alerts = registrar.alerts(false).unwrap();
        assert_eq!(alerts.len(), 1);
        registrar.resolve_alert(&alerts[0].id).unwrap();
        assert!(registrar.alerts(false).unwrap().is_empty());
    }
}

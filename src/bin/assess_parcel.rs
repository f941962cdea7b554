//! Assess Parcel
//!
//! Runs the full validation pipeline on a recorded request (statistics and
//! daily weather captured from the live collaborators) and prints the
//! report as JSON. Optionally confirms the parcel against a set of existing
//! plots to exercise overlap detection.
//!
//! Run with: cargo run --bin assess_parcel -- request.json [--config engine.json] [--today 2026-03-01]

use anyhow::{Context, Result};
use clap::Parser;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use land_scorer_rust::registry::NewPlot;
use land_scorer_rust::{
    ConfirmPlotRequest, ConfirmPlotResponse, DailyWeather, Decision, EngineConfig, InMemoryRegistry,
    OverlapDetector, ParcelAssessor, ParcelPolygon, ParcelRegistrar, ParcelRegistry, ParcelStatistics,
    StaticSensing, StaticWeather, ValidationReport, ValidationRequest,
};

/// Recorded request
#[derive(Debug, Deserialize)]
struct RecordedRequest {
    parcel: ValidationRequest,
    statistics: ParcelStatistics,
    #[serde(default)]
    daily_weather: Vec<DailyWeather>,
    #[serde(default)]
    existing_plots: Vec<ExistingPlot>,
    #[serde(default)]
    confirm: Option<FarmerDetails>,
}

#[derive(Debug, Deserialize)]
struct ExistingPlot {
    farmer_name: String,
    farmer_phone: String,
    #[serde(default)]
    label: Option<String>,
    polygon: ParcelPolygon,
}

#[derive(Debug, Deserialize)]
struct FarmerDetails {
    farmer_name: String,
    farmer_phone: String,
    #[serde(default)]
    farmer_email: Option<String>,
    #[serde(default)]
    plot_label: Option<String>,
}

#[derive(Debug, Serialize)]
struct Output {
    report: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation: Option<ConfirmPlotResponse>,
}

#[derive(Parser, Debug)]
#[command(name = "assess_parcel", about = "Validate a recorded parcel request and print the report as JSON")]
struct Args {
    /// Recorded request JSON (parcel, statistics, daily weather)
    request: PathBuf,

    /// Engine configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

fn seed_registry(registry: &InMemoryRegistry, plots: Vec<ExistingPlot>) -> Result<()> {
    for plot in plots {
        let farmer = registry.upsert_farmer(&plot.farmer_name, &plot.farmer_phone, None)?;
        registry.insert_plot(NewPlot {
            farmer_id: farmer.id,
            label: plot.label,
            polygon: plot.polygon,
            claimed_crop: None,
            area_acres: 0.0,
            effective_area_acres: 0.0,
            ndvi_mean: 0.0,
            decision: Decision::Pass,
            confidence_score: 0.0,
        })?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "land_scorer_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let contents = fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request: {:?}", args.request))?;
    let recorded: RecordedRequest =
        serde_json::from_str(&contents).with_context(|| "Failed to parse request JSON")?;

    let assessor = ParcelAssessor::new(
        config.clone(),
        Arc::new(StaticSensing::new(recorded.statistics)),
        Arc::new(StaticWeather::new(recorded.daily_weather)),
    )?;

    let report = assessor.validate(&recorded.parcel, today)?;

    let confirmation = match recorded.confirm {
        Some(farmer) if report.decision != Decision::Fail => {
            let registry = Arc::new(InMemoryRegistry::new());
            seed_registry(&registry, recorded.existing_plots)?;

            let registrar = ParcelRegistrar::new(registry, OverlapDetector::new(config.overlap_threshold));
            Some(registrar.confirm(ConfirmPlotRequest {
                farmer_name: farmer.farmer_name,
                farmer_phone: farmer.farmer_phone,
                farmer_email: farmer.farmer_email,
                polygon: recorded.parcel.polygon.clone(),
                plot_label: farmer.plot_label,
                claimed_crop: recorded.parcel.claimed_crop.clone(),
                area_acres: report.plot_area_acres,
                cultivated_percentage: report.cultivated_percentage,
                ndvi_mean: report.mean_ndvi,
                decision: report.decision,
                confidence_score: report.confidence_score,
            })?)
        }
        Some(_) => {
            tracing::warn!("Parcel decision is FAIL; skipping confirmation");
            None
        }
        None => None,
    };

    println!("{}", serde_json::to_string_pretty(&Output { report, confirmation })?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_flags() {
        let args = Args::try_parse_from(["assess_parcel", "req.json", "--config", "engine.json", "--today", "2026-03-01"])
            .unwrap();
        assert_eq!(args.request, PathBuf::from("req.json"));
        assert_eq!(args.config, Some(PathBuf::from("engine.json")));
        assert_eq!(args.today, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn test_help_and_bad_input_are_not_requests() {
        let help = Args::try_parse_from(["assess_parcel", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(Args::try_parse_from(["assess_parcel", "req.json", "--today", "03/01/2026"]).is_err());
        assert!(Args::try_parse_from(["assess_parcel"]).is_err());
    }
}

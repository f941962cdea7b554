//! Collaborator seams
//!
//! The engine never talks to satellites or weather archives itself. It asks
//! these traits and treats the answers as already-materialised values.
//!
//! - `RemoteSensing`: per-parcel optical/radar/land-cover statistics
//! - `WeatherSource`: daily weather samples for a location and date range
//!
//! `StaticSensing` and `StaticWeather` serve pre-recorded data (binary and
//! tests).

use chrono::NaiveDate;

use crate::data::{DailyWeather, ImageryWindow, Location, ParcelStatistics, WeatherObservation};
use crate::error::{SensingError, WeatherError};
use crate::geometry::ParcelPolygon;

/// Remote-sensing statistics provider
pub trait RemoteSensing: Send + Sync {
    /// Aggregate statistics for one parcel; `NoImagery` when nothing usable
    /// exists for the window at this cloud threshold
    fn parcel_statistics(
        &self,
        polygon: &ParcelPolygon,
        window: ImageryWindow,
        cloud_threshold_pct: u8,
    ) -> Result<ParcelStatistics, SensingError>;
}

/// Daily weather provider
pub trait WeatherSource: Send + Sync {
    /// Samples for `[start, end]`; an empty vector is a valid answer
    fn daily_samples(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyWeather>, WeatherError>;

    /// Fetch and aggregate `[start, end]`
    fn observation(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherObservation, WeatherError> {
        if start > end {
            return Err(WeatherError::InvalidWindow { start, end });
        }
        let samples = self.daily_samples(location, start, end)?;
        Ok(WeatherObservation::aggregate(&samples, start, end))
    }
}

/// Pre-recorded daily weather, served for any location
#[derive(Debug, Clone, Default)]
pub struct StaticWeather {
    samples: Vec<DailyWeather>,
}

impl StaticWeather {
    pub fn new(mut samples: Vec<DailyWeather>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self { samples }
    }
}

impl WeatherSource for StaticWeather {
    fn daily_samples(
        &self,
        _location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyWeather>, WeatherError> {
        Ok(self
            .samples
            .iter()
            .filter(|s| start <= s.date && s.date <= end)
            .cloned()
            .collect())
    }
}

/// Weather source that always fails
#[derive(Debug, Clone)]
pub struct UnavailableWeather {
    pub reason: String,
}

impl WeatherSource for UnavailableWeather {
    fn daily_samples(&self, _: Location, _: NaiveDate, _: NaiveDate) -> Result<Vec<DailyWeather>, WeatherError> {
        Err(WeatherError::Unavailable(self.reason.clone()))
    }
}

/// Pre-recorded parcel statistics (or a fixed failure)
#[derive(Debug, Clone)]
pub struct StaticSensing {
    response: Result<ParcelStatistics, SensingError>,
}

impl StaticSensing {
    pub fn new(stats: ParcelStatistics) -> Self {
        Self { response: Ok(stats) }
    }

    pub fn failing(error: SensingError) -> Self {
        Self { response: Err(error) }
    }
}

impl RemoteSensing for StaticSensing {
    fn parcel_statistics(
        &self,
        _polygon: &ParcelPolygon,
        window: ImageryWindow,
        cloud_threshold_pct: u8,
    ) -> Result<ParcelStatistics, SensingError> {
        match &self.response {
            Ok(stats) => Ok(stats.clone()),
            Err(SensingError::NoImagery { .. }) => Err(SensingError::NoImagery {
                window,
                cloud_threshold: cloud_threshold_pct,
            }),
            Err(e) => Err(e.clone()),
        }
    }
}

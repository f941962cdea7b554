//! Weather Window Resolution
//!
//! Picks the date range a crop is judged against:
//!
//! 1. Explicit year-month window from the caller, end clamped to yesterday
//!    (the latest archived day). Empty after clamping → trailing lookback.
//! 2. Seasonal crop → the most recently *completed* occurrence of its season.
//!    A season still in progress is never scored; last year's is used instead.
//! 3. Year-round crop → trailing lookback ending yesterday.
//!
//! Wrapping seasons (start month > end month) start in the year before they
//! end, so `start <= end` always holds.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::crop_table::GrowingSeason;
use crate::data::{last_day_of_month, ImageryWindow};

/// How a window was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    Explicit,
    Season,
    TrailingLookback,
}

/// Inclusive date range for a weather fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: WindowSource,
}

impl WeatherWindow {
    /// Number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// `lookback_days` ending yesterday
pub fn trailing_window(today: NaiveDate, lookback_days: u32) -> WeatherWindow {
    let end = today.pred_opt().unwrap_or(today);
    let start = end
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .unwrap_or(end);
    WeatherWindow { start, end, source: WindowSource::TrailingLookback }
}

/// Most recent fully completed occurrence of a season, relative to `today`
pub fn completed_season(season: GrowingSeason, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let mut end_year = today.year();
    if today <= last_day_of_month(end_year, season.end_month)? {
        end_year -= 1;
    }

    let end = last_day_of_month(end_year, season.end_month)?;
    let start_year = if season.wraps_year_end() { end_year - 1 } else { end_year };
    let start = NaiveDate::from_ymd_opt(start_year, season.start_month, 1)?;
    Some((start, end))
}

/// Resolve the weather window for one crop
pub fn resolve_weather_window(
    season: GrowingSeason,
    explicit: Option<ImageryWindow>,
    today: NaiveDate,
    lookback_days: u32,
) -> WeatherWindow {
    if let Some(window) = explicit {
        return explicit_window(window, today, lookback_days);
    }

    if season.is_year_round() {
        return trailing_window(today, lookback_days);
    }

    match completed_season(season, today) {
        Some((start, end)) => {
            tracing::debug!(
                "Season {}-{} resolved to {} → {}",
                season.start_month,
                season.end_month,
                start,
                end
            );
            WeatherWindow { start, end, source: WindowSource::Season }
        }
        None => trailing_window(today, lookback_days),
    }
}

fn explicit_window(window: ImageryWindow, today: NaiveDate, lookback_days: u32) -> WeatherWindow {
    let yesterday = today.pred_opt().unwrap_or(today);
    match (window.first_day(), window.last_day()) {
        (Some(start), Some(last)) => {
            let end = last.min(yesterday);
            if start <= end {
                WeatherWindow { start, end, source: WindowSource::Explicit }
            } else {
                tracing::info!(
                    "Requested window {} lies after {}; using trailing {} days",
                    window,
                    yesterday,
                    lookback_days
                );
                trailing_window(today, lookback_days)
            }
        }
        _ => trailing_window(today, lookback_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_before_end_uses_previous_year() {
        let kharif = GrowingSeason::new(6, 10).unwrap();
        let w = resolve_weather_window(kharif, None, date(2026, 3, 15), 90);
        assert_eq!(w.source, WindowSource::Season);
        assert_eq!(w.start, date(2025, 6, 1));
        assert_eq!(w.end, date(2025, 10, 31));
    }

    #[test]
    fn test_season_after_end_uses_current_year() {
        let kharif = GrowingSeason::new(6, 10).unwrap();
        let w = resolve_weather_window(kharif, None, date(2026, 11, 1), 90);
        assert_eq!(w.start, date(2026, 6, 1));
        assert_eq!(w.end, date(2026, 10, 31));
    }

    #[test]
    fn test_season_end_day_is_not_completed() {
        let kharif = GrowingSeason::new(6, 10).unwrap();
        let w = resolve_weather_window(kharif, None, date(2026, 10, 31), 90);
        assert_eq!(w.end, date(2025, 10, 31));
    }

    #[test]
    fn test_wrapping_season_mid_wrap() {
        let winter = GrowingSeason::new(11, 2).unwrap();
        let w = resolve_weather_window(winter, None, date(2026, 1, 10), 90);
        assert_eq!(w.start, date(2024, 11, 1));
        assert_eq!(w.end, date(2025, 2, 28));
        assert!(w.start < w.end);
    }

    #[test]
    fn test_wrapping_season_after_end() {
        let winter = GrowingSeason::new(11, 2).unwrap();
        let w = resolve_weather_window(winter, None, date(2026, 3, 1), 90);
        assert_eq!(w.start, date(2025, 11, 1));
        assert_eq!(w.end, date(2026, 2, 28));
    }

    #[test]
    fn test_year_round_uses_lookback() {
        let w = resolve_weather_window(GrowingSeason::YEAR_ROUND, None, date(2026, 5, 10), 90);
        assert_eq!(w.source, WindowSource::TrailingLookback);
        assert_eq!(w.end, date(2026, 5, 9));
        assert_eq!(w.start, date(2026, 2, 8));
    }

    #[test]
    fn test_explicit_window_clamped_to_yesterday() {
        let window = ImageryWindow::new(2026, 1, 2026, 12).unwrap();
        let w = resolve_weather_window(GrowingSeason::YEAR_ROUND, Some(window), date(2026, 5, 10), 90);
        assert_eq!(w.source, WindowSource::Explicit);
        assert_eq!(w.start, date(2026, 1, 1));
        assert_eq!(w.end, date(2026, 5, 9));
    }

    #[test]
    fn test_future_explicit_window_falls_back() {
        let window = ImageryWindow::new(2027, 1, 2027, 3).unwrap();
        let w = resolve_weather_window(GrowingSeason::YEAR_ROUND, Some(window), date(2026, 5, 10), 30);
        assert_eq!(w.source, WindowSource::TrailingLookback);
        assert_eq!(w.days(), 31);
    }
}

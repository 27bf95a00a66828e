//! Synthetic climate model
//!
//! Maps (day, location, generator draw, bias) to a daily precipitation depth.
//! The model is a hand-tuned sum of analytic terms, not a calibrated physical
//! model:
//!
//! | Term | Shape | Peak |
//! | --- | --- | --- |
//! | seasonal | `0.45 + 0.55·sin(2π(doy−70)/365)` | late spring |
//! | west lift | ramps up west of −105° | 8.4 mm |
//! | gulf flow | ramps up south of 31° | 7.1 mm |
//! | storm track | Gaussian band around an oscillating latitude near 39° | 10.5 mm |
//! | Pacific band | Gaussian band around −122°, seasonally modulated | 9 mm |
//! | noise | one generator draw × 4.2 | 4.2 mm |
//!
//! The constants are kept literally; changing any of them changes every
//! forecast ever produced for a given request.

use crate::core_types::Millimeters;
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Upper clamp of a cell value
pub const MAX_PRECIPITATION_MM: f64 = 65.0;

/// Additive base term before bias
const BASE_MM: f64 = 2.5;

/// Weight of the seasonal cycle
const SEASONAL_WEIGHT_MM: f64 = 10.2;

/// Weight of the stochastic term
const NOISE_WEIGHT_MM: f64 = 4.2;

/// 1-based day-of-year (January 1 = 1, March 1 = 60 or 61 in leap years)
#[must_use]
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Terms of the model that depend only on the day
///
/// Computed once per forecast day and shared by every cell of that day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayPhase {
    /// 0-based offset from the start of the window
    pub day_offset: u32,
    /// 1-based day-of-year of the forecast date
    pub day_of_year: u32,
    /// Seasonal factor in `[-0.1, 1.0]`
    pub seasonal: f64,
    /// Latitude the storm track is centred on for this day
    pub storm_center_lat: f64,
}

impl DayPhase {
    /// Phase for a window offset and a day-of-year
    #[must_use]
    pub fn new(day_offset: u32, day_of_year: u32) -> Self {
        let doy = f64::from(day_of_year);
        let seasonal = 0.45 + 0.55 * ((2.0 * PI * (doy - 70.0)) / 365.0).sin();
        let storm_center_lat = 39.0 + 3.0 * ((f64::from(day_offset) + doy) / 16.0).sin();
        Self {
            day_offset,
            day_of_year,
            seasonal,
            storm_center_lat,
        }
    }

    /// Phase for the `day_offset`-th day of a window, dated `date`
    #[must_use]
    pub fn for_date(day_offset: u32, date: NaiveDate) -> Self {
        Self::new(day_offset, day_of_year(date))
    }
}

/// Deterministic (draw-independent) terms at one location, in mm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateTerms {
    pub seasonal: f64,
    pub west_lift: f64,
    pub gulf_flow: f64,
    pub storm_track: f64,
    pub pacific_band: f64,
}

impl ClimateTerms {
    /// Evaluate the analytic terms at `(lon, lat)` for one day
    #[must_use]
    pub fn at(phase: &DayPhase, lon: f64, lat: f64) -> Self {
        let west_lift = (-(lon + 105.0) / 20.0).clamp(0.0, 1.0) * 8.4;
        let gulf_flow = ((31.0 - lat) / 8.0).clamp(0.0, 1.0) * 7.1;
        let storm_track = (-(lat - phase.storm_center_lat).powi(2) / 28.0).exp() * 10.5;
        let pacific_band = (-(lon + 122.0).powi(2) / 48.0).exp() * (6.0 + 3.0 * phase.seasonal);
        Self {
            seasonal: phase.seasonal,
            west_lift,
            gulf_flow,
            storm_track,
            pacific_band,
        }
    }

    /// Combine with a generator draw in `[0, 1)` and a bias factor
    ///
    /// Summation order is fixed so results are bit-identical across runs.
    #[must_use]
    pub fn combine(&self, draw: f64, bias: f64) -> Millimeters {
        let noise = draw * NOISE_WEIGHT_MM;
        let raw = (BASE_MM
            + self.seasonal * SEASONAL_WEIGHT_MM
            + self.west_lift
            + self.gulf_flow
            + self.storm_track
            + self.pacific_band
            + noise)
            * bias;
        Millimeters::new(raw).clamp_to(0.0, MAX_PRECIPITATION_MM)
    }
}

/// Precipitation at `(lon, lat)` for one day, given a draw and a bias
#[must_use]
pub fn precipitation(phase: &DayPhase, lon: f64, lat: f64, draw: f64, bias: f64) -> Millimeters {
    ClimateTerms::at(phase, lon, lat).combine(draw, bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(day_of_year(date(2025, 1, 1)), 1);
        assert_eq!(day_of_year(date(2025, 3, 1)), 60);
        assert_eq!(day_of_year(date(2024, 3, 1)), 61);
        assert_eq!(day_of_year(date(2025, 12, 31)), 365);
    }

    #[test]
    fn test_reference_values() {
        let phase = DayPhase::new(0, 60);
        assert_relative_eq!(
            *precipitation(&phase, -100.0, 40.0, 0.5, 0.95),
            15.484565491987839,
            max_relative = 1e-12
        );

        let phase = DayPhase::new(3, 200);
        assert_relative_eq!(
            *precipitation(&phase, -122.0, 26.0, 0.99, 1.08),
            38.76894354958639,
            max_relative = 1e-12
        );

        let phase = DayPhase::new(0, 1);
        assert_relative_eq!(
            *precipitation(&phase, -70.0, 49.0, 0.0, 1.0),
            2.223560747212099,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_seasonal_range() {
        for doy in 1..=366 {
            let s = DayPhase::new(0, doy).seasonal;
            assert!((-0.1 - 1e-12..=1.0 + 1e-12).contains(&s), "seasonal {s} at doy {doy}");
        }
    }

    #[test]
    fn test_west_and_gulf_terms_saturate() {
        let phase = DayPhase::new(0, 100);
        let far_west = ClimateTerms::at(&phase, -130.0, 40.0);
        let east = ClimateTerms::at(&phase, -80.0, 40.0);
        assert_relative_eq!(far_west.west_lift, 8.4);
        assert_eq!(east.west_lift, 0.0);

        let deep_south = ClimateTerms::at(&phase, -90.0, 20.0);
        let north = ClimateTerms::at(&phase, -90.0, 45.0);
        assert_relative_eq!(deep_south.gulf_flow, 7.1);
        assert_eq!(north.gulf_flow, 0.0);
    }

    #[test]
    fn test_storm_track_peaks_at_center() {
        let phase = DayPhase::new(2, 150);
        let on_track = ClimateTerms::at(&phase, -95.0, phase.storm_center_lat);
        let off_track = ClimateTerms::at(&phase, -95.0, phase.storm_center_lat + 6.0);
        assert_relative_eq!(on_track.storm_track, 10.5);
        assert!(off_track.storm_track < on_track.storm_track);
    }

    #[test]
    fn test_clamped_to_range() {
        let phase = DayPhase::new(0, 161);
        assert_eq!(*precipitation(&phase, -122.0, 25.0, 0.999, 10.0), MAX_PRECIPITATION_MM);
        assert_eq!(*precipitation(&phase, -122.0, 25.0, 0.5, -1.0), 0.0);
    }

    #[test]
    fn test_bias_positive_floor() {
        // Base term alone keeps any biased value positive
        let phase = DayPhase::new(0, 1);
        for lon in [-124.0, -100.0, -70.0] {
            for lat in [25.0, 37.0, 49.0] {
                assert!(*precipitation(&phase, lon, lat, 0.0, 0.95) > 0.0);
            }
        }
    }
}

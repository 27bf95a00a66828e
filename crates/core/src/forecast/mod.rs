//! Forecast synthesis
//!
//! Turns a [`ForecastRequest`] into a [`ForecastResult`]: one list of land
//! cells per forecast day plus per-day aggregates.
//!
//! # Traversal order
//!
//! The generator stream is consumed in a fixed order, and that order is part
//! of the output contract (reordering changes every value):
//!
//! 1. days `0..window` (outer)
//! 2. latitude from 24° upward, accumulating `+= 1.1` while `<= 50`
//! 3. longitude from −125° eastward, accumulating `+= 1.3` while `<= −66`
//!
//! A draw is consumed only for points on land. Points off land emit no cell
//! and consume nothing.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use precip_forecast_core::core_types::{ForecastRequest, TrainingPeriod};
//! use precip_forecast_core::forecast::ForecastSynthesizer;
//! use precip_forecast_core::geo::MultiPolygon;
//!
//! let request = ForecastRequest::new(
//!     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
//!     3,
//!     TrainingPeriod::Recent,
//! );
//! // No boundary loaded: empty result, no error
//! let result = ForecastSynthesizer::default().synthesize(&request, None::<&MultiPolygon>);
//! assert!(result.is_empty());
//! ```

pub mod summary;

pub use summary::{format_day_label, DayCard, ForecastSummary};

use crate::climate::{precipitation, DayPhase};
use crate::core_types::{ForecastRequest, Millimeters, Mulberry32};
use crate::geo::{LandMask, MapContext};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Regular lon/lat lattice the forecast is evaluated on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lon_step: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lat_step: f64,
}

impl GridSpec {
    /// Contiguous-US lattice: lon −125..−66 step 1.3, lat 24..50 step 1.1
    pub const CONUS: GridSpec = GridSpec {
        lon_min: -125.0,
        lon_max: -66.0,
        lon_step: 1.3,
        lat_min: 24.0,
        lat_max: 50.0,
        lat_step: 1.1,
    };

    #[must_use]
    pub const fn conus() -> Self {
        Self::CONUS
    }

    /// Latitudes in traversal order (accumulated, not multiplied)
    #[must_use]
    pub fn latitudes(&self) -> Vec<f64> {
        accumulate(self.lat_min, self.lat_max, self.lat_step)
    }

    /// Longitudes in traversal order (accumulated, not multiplied)
    #[must_use]
    pub fn longitudes(&self) -> Vec<f64> {
        accumulate(self.lon_min, self.lon_max, self.lon_step)
    }

    /// Every lattice point in traversal order: latitude rows, longitude within a row
    #[must_use]
    pub fn points(&self) -> Vec<GridPoint> {
        let lons = self.longitudes();
        self.latitudes()
            .into_iter()
            .flat_map(|lat| lons.iter().map(move |&lon| GridPoint { lon, lat }))
            .collect()
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::conus()
    }
}

fn accumulate(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    if step.is_nan() || step <= 0.0 {
        return values;
    }
    let mut v = min;
    while v <= max {
        values.push(v);
        v += step;
    }
    values
}

/// One lattice point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lon: f64,
    pub lat: f64,
}

/// One synthesized land cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub lon: f64,
    pub lat: f64,
    /// Precipitation in `[0, 65]` mm
    pub value: Millimeters,
}

/// Aggregates of one forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Mean over the day's cells, 0 if there are none
    pub average: Millimeters,
    /// Maximum over the day's cells, 0 if there are none
    pub peak: Millimeters,
}

impl DaySummary {
    /// Aggregate a day's cells
    #[must_use]
    pub fn from_cells(date: NaiveDate, cells: &[Cell]) -> Self {
        let total: Millimeters = cells.iter().map(|c| c.value).sum();
        let average = if cells.is_empty() {
            Millimeters::ZERO
        } else {
            total / cells.len() as f64
        };
        let peak = cells
            .iter()
            .map(|c| c.value)
            .fold(Millimeters::ZERO, Millimeters::max);
        Self {
            date,
            average,
            peak,
        }
    }
}

/// Output of one forecast run
///
/// `days[i]` summarizes `grid_by_day[i]`. A new run replaces the whole value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastResult {
    pub days: Vec<DaySummary>,
    pub grid_by_day: Vec<Vec<Cell>>,
}

impl ForecastResult {
    /// Number of forecast days
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Summary of day `index`
    #[must_use]
    pub fn day(&self, index: usize) -> Option<&DaySummary> {
        self.days.get(index)
    }

    /// Cells of day `index`, empty when the index is out of range
    #[must_use]
    pub fn cells(&self, index: usize) -> &[Cell] {
        self.grid_by_day.get(index).map_or(&[], Vec::as_slice)
    }

    /// Cells across all days
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.grid_by_day.iter().map(Vec::len).sum()
    }
}

/// Forecast synthesizer over a fixed lattice
#[derive(Debug, Clone, Default)]
pub struct ForecastSynthesizer {
    grid: GridSpec,
}

impl ForecastSynthesizer {
    #[must_use]
    pub fn new(grid: GridSpec) -> Self {
        Self { grid }
    }

    #[must_use]
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Synthesize a forecast; `None` land yields an empty result
    ///
    /// Containment does not depend on the generator, so the land mask is
    /// evaluated once (in parallel) and reused for every day. Draws are then
    /// consumed sequentially in traversal order from a generator owned by
    /// this call.
    pub fn synthesize<M>(&self, request: &ForecastRequest, land: Option<&M>) -> ForecastResult
    where
        M: LandMask + Sync + ?Sized,
    {
        let Some(land) = land else {
            warn!("Forecast requested before boundary data was loaded");
            return ForecastResult::default();
        };

        let seed = request.seed();
        let bias = request.bias();
        let mut rng = Mulberry32::new(seed);

        let points = self.grid.points();
        let mask: Vec<bool> = points
            .par_iter()
            .map(|p| land.contains(p.lon, p.lat))
            .collect();
        let land_points: Vec<GridPoint> = points
            .iter()
            .zip(&mask)
            .filter(|(_, &on_land)| on_land)
            .map(|(p, _)| *p)
            .collect();

        info!(
            "Synthesizing forecast {} (seed {}, bias {:.2}): {} days x {} land cells of {} points",
            request.seed_key(),
            seed,
            bias,
            request.effective_window(),
            land_points.len(),
            points.len()
        );
        if land_points.is_empty() {
            warn!("No lattice point falls inside the land boundary");
        }

        let mut result = ForecastResult::default();
        for (offset, date) in (0_u32..).zip(request.dates()) {
            let phase = DayPhase::for_date(offset, date);
            let cells: Vec<Cell> = land_points
                .iter()
                .map(|p| Cell {
                    lon: p.lon,
                    lat: p.lat,
                    value: precipitation(&phase, p.lon, p.lat, rng.next_f64(), bias),
                })
                .collect();

            let summary = DaySummary::from_cells(date, &cells);
            debug!(
                "Day {} ({}, doy {}): avg {:.2}, peak {:.2}",
                offset, date, phase.day_of_year, summary.average, summary.peak
            );
            result.days.push(summary);
            result.grid_by_day.push(cells);
        }
        result
    }
}

/// Synthesize on the contiguous-US lattice using a map context
///
/// Returns an empty result when the context is `None`.
pub fn synthesize(request: &ForecastRequest, context: Option<&MapContext>) -> ForecastResult {
    ForecastSynthesizer::default().synthesize(request, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TrainingPeriod;
    use crate::geo::{MultiPolygon, Polygon};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    /// Everything is land
    struct AllLand;

    impl LandMask for AllLand {
        fn contains(&self, _lon: f64, _lat: f64) -> bool {
            true
        }
    }

    fn request(window: u32) -> ForecastRequest {
        ForecastRequest::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            window,
            TrainingPeriod::Recent,
        )
    }

    fn box_land(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> MultiPolygon {
        MultiPolygon::new(vec![Polygon::new(vec![vec![
            Point2::new(lon0, lat0),
            Point2::new(lon1, lat0),
            Point2::new(lon1, lat1),
            Point2::new(lon0, lat1),
        ]])])
    }

    #[test]
    fn test_lattice_shape() {
        let grid = GridSpec::CONUS;
        assert_eq!(grid.latitudes().len(), 24);
        assert_eq!(grid.longitudes().len(), 46);
        assert_eq!(grid.points().len(), 24 * 46);
        // Accumulated, so the last row carries float drift
        assert_eq!(*grid.latitudes().last().unwrap(), 49.30000000000003);
        assert_eq!(*grid.longitudes().last().unwrap(), -66.50000000000013);
    }

    #[test]
    fn test_points_are_row_major_by_latitude() {
        let pts = GridSpec::CONUS.points();
        assert_eq!(pts[0], GridPoint { lon: -125.0, lat: 24.0 });
        assert_eq!(pts[1].lat, 24.0);
        assert_relative_eq!(pts[1].lon, -123.7);
        assert_relative_eq!(pts[46].lat, 25.1);
        assert_eq!(pts[46].lon, -125.0);
    }

    #[test]
    fn test_non_positive_step_is_empty() {
        let grid = GridSpec {
            lat_step: 0.0,
            ..GridSpec::CONUS
        };
        assert!(grid.points().is_empty());
    }

    #[test]
    fn test_first_cells_use_first_draws() {
        let result = ForecastSynthesizer::default().synthesize(&request(1), Some(&AllLand));
        let mut rng = Mulberry32::new(request(1).seed());
        let phase = DayPhase::new(0, 60);
        for cell in result.cells(0).iter().take(5) {
            let expected = precipitation(&phase, cell.lon, cell.lat, rng.next_f64(), 0.95);
            assert_eq!(cell.value, expected);
        }
    }

    #[test]
    fn test_off_land_points_consume_no_draws() {
        // Only the south-west corner row segment is land
        let land = box_land(-125.5, 23.5, -119.0, 24.5);
        let result = ForecastSynthesizer::default().synthesize(&request(2), Some(&land));
        let day0 = result.cells(0);
        let day1 = result.cells(1);
        assert_eq!(day0.len(), 5);
        assert_eq!(day1.len(), 5);

        let mut rng = Mulberry32::new(request(2).seed());
        let draws: Vec<f64> = (0..10).map(|_| rng.next_f64()).collect();
        let phase1 = DayPhase::new(1, 61);
        let expected = precipitation(&phase1, day1[0].lon, day1[0].lat, draws[5], 0.95);
        assert_eq!(day1[0].value, expected);
    }

    #[test]
    fn test_empty_land_gives_zero_aggregates() {
        let land = box_land(0.0, 0.0, 1.0, 1.0);
        let result = ForecastSynthesizer::default().synthesize(&request(3), Some(&land));
        assert_eq!(result.len(), 3);
        for day in &result.days {
            assert_eq!(day.average, Millimeters::ZERO);
            assert_eq!(day.peak, Millimeters::ZERO);
        }
        assert_eq!(result.total_cells(), 0);
    }

    #[test]
    fn test_no_boundary_is_empty() {
        let result = synthesize(&request(5), None);
        assert!(result.days.is_empty());
        assert!(result.grid_by_day.is_empty());
    }

    #[test]
    fn test_out_of_range_day_has_no_cells() {
        let result = ForecastSynthesizer::default().synthesize(&request(2), Some(&AllLand));
        assert!(result.cells(7).is_empty());
        assert!(result.day(7).is_none());
    }

    #[test]
    fn test_day_summary_aggregation() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let cells: Vec<Cell> = [1.0, 4.0, 10.0]
            .iter()
            .map(|&v| Cell {
                lon: -100.0,
                lat: 40.0,
                value: Millimeters::new(v),
            })
            .collect();
        let s = DaySummary::from_cells(date, &cells);
        assert_eq!(s.average, Millimeters::new(5.0));
        assert_eq!(s.peak, Millimeters::new(10.0));
        let empty = DaySummary::from_cells(date, &[]);
        assert_eq!(empty.average, Millimeters::ZERO);
        assert_eq!(empty.peak, Millimeters::ZERO);
    }
}

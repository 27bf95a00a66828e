//! Presentation data derived from a forecast result

use super::{DaySummary, ForecastResult};
use crate::core_types::Millimeters;
use chrono::NaiveDate;
use serde::Serialize;

/// Short calendar label, e.g. "Mar 1"
#[must_use]
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Window-level metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub window_days: usize,
    /// Mean of the daily averages, 0 for an empty result
    pub mean: Millimeters,
    /// Largest daily peak, 0 for an empty result
    pub peak: Millimeters,
    /// First day with the largest average
    pub wettest: Option<DaySummary>,
}

impl ForecastSummary {
    #[must_use]
    pub fn from_result(result: &ForecastResult) -> Self {
        let days = &result.days;
        let total: Millimeters = days.iter().map(|d| d.average).sum();
        let mean = if days.is_empty() {
            Millimeters::ZERO
        } else {
            total / days.len() as f64
        };
        let peak = days
            .iter()
            .map(|d| d.peak)
            .fold(Millimeters::ZERO, Millimeters::max);
        // Strictly greater keeps the earliest of tied days
        let wettest = days.iter().copied().reduce(|best, d| {
            if d.average > best.average {
                d
            } else {
                best
            }
        });

        Self {
            window_days: days.len(),
            mean,
            peak,
            wettest,
        }
    }

    /// `(label, value)` pairs in display order
    #[must_use]
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Window", format!("{} days", self.window_days)),
            ("Mean precipitation", format!("{:.1} mm/day", self.mean.value())),
            ("Peak cell", format!("{:.1} mm", self.peak.value())),
            (
                "Wettest day",
                self.wettest
                    .map_or_else(|| "n/a".to_string(), |d| format_day_label(d.date)),
            ),
        ]
    }
}

/// One per-day card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCard {
    /// "Day N · Mon D", N 1-based
    pub label: String,
    /// "X.X mm/day"
    pub amount: String,
}

impl DayCard {
    #[must_use]
    pub fn new(index: usize, day: &DaySummary) -> Self {
        Self {
            label: format!("Day {} · {}", index + 1, format_day_label(day.date)),
            amount: format!("{:.1} mm/day", day.average.value()),
        }
    }

    /// Cards for every day of a result
    #[must_use]
    pub fn all(result: &ForecastResult) -> Vec<Self> {
        result
            .days
            .iter()
            .enumerate()
            .map(|(i, d)| Self::new(i, d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32, average: f64, peak: f64) -> DaySummary {
        DaySummary {
            date: NaiveDate::from_ymd_opt(2025, m, d).unwrap(),
            average: Millimeters::new(average),
            peak: Millimeters::new(peak),
        }
    }

    fn result(days: Vec<DaySummary>) -> ForecastResult {
        let grid_by_day = vec![Vec::new(); days.len()];
        ForecastResult { days, grid_by_day }
    }

    #[test]
    fn test_summary_metrics() {
        let r = result(vec![
            day(3, 1, 4.0, 20.0),
            day(3, 2, 9.5, 31.26),
            day(3, 3, 9.5, 12.0),
        ]);
        let s = ForecastSummary::from_result(&r);
        assert_eq!(s.window_days, 3);
        assert_eq!(s.mean, Millimeters::new(23.0 / 3.0));
        assert_eq!(s.peak, Millimeters::new(31.26));
        assert_eq!(s.wettest.unwrap().date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());

        let metrics = s.metrics();
        assert_eq!(metrics[0], ("Window", "3 days".to_string()));
        assert_eq!(metrics[1], ("Mean precipitation", "7.7 mm/day".to_string()));
        assert_eq!(metrics[2].1, "31.3 mm");
        assert_eq!(metrics[3], ("Wettest day", "Mar 2".to_string()));
    }

    #[test]
    fn test_empty_summary() {
        let s = ForecastSummary::from_result(&ForecastResult::default());
        assert_eq!(s.window_days, 0);
        assert_eq!(s.mean, Millimeters::ZERO);
        assert_eq!(s.peak, Millimeters::ZERO);
        assert!(s.wettest.is_none());
        assert_eq!(s.metrics()[3].1, "n/a");
    }

    #[test]
    fn test_day_cards() {
        let r = result(vec![day(12, 30, 3.04, 8.0), day(12, 31, 12.96, 40.0)]);
        let cards = DayCard::all(&r);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].label, "Day 1 · Dec 30");
        assert_eq!(cards[0].amount, "3.0 mm/day");
        assert_eq!(cards[1].label, "Day 2 · Dec 31");
        assert_eq!(cards[1].amount, "13.0 mm/day");
    }

    #[test]
    fn test_day_label_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(format_day_label(date), "Jul 4");
    }
}

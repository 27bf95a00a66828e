//! Forecast requests and input clamping
//!
//! A [`ForecastRequest`] is the full input of a forecast run. Its serialized
//! form (`"{start}|{window}|{training}"`) is what the seed is derived from, so
//! two equal requests always produce the same forecast.
//!
//! Clamping helpers live here too: window size is limited to
//! [`MIN_WINDOW`]..=[`MAX_WINDOW`], the start date is kept inside one calendar
//! year so the whole window fits, and the day selector is kept inside the
//! window. Callers are expected to clamp at the input boundary; the
//! synthesizer re-clamps the window anyway.

use super::seed::{Seed, KEY_SEPARATOR};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Shortest forecast window in days
pub const MIN_WINDOW: u32 = 1;

/// Longest forecast window in days
pub const MAX_WINDOW: u32 = 14;

/// Calendar year the date picker is bounded to
pub const FORECAST_YEAR: i32 = 2025;

/// Training period selecting a multiplicative bias
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TrainingPeriod {
    /// 2000-2024 climatology (wetter bias)
    Full,
    /// 2015-2024 climatology (drier bias)
    #[default]
    Recent,
    /// Any other label, applied without bias
    Other(String),
}

impl TrainingPeriod {
    /// Key used in the seed string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Full => "2000-2024",
            Self::Recent => "2015-2024",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Multiplicative bias applied to every synthesized value
    #[must_use]
    pub fn bias(&self) -> f64 {
        match self {
            Self::Full => 1.08,
            Self::Recent => 0.95,
            Self::Other(_) => 1.0,
        }
    }
}

impl FromStr for TrainingPeriod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "2000-2024" => Self::Full,
            "2015-2024" => Self::Recent,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for TrainingPeriod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "2000-2024" => Self::Full,
            "2015-2024" => Self::Recent,
            _ => Self::Other(s),
        }
    }
}

impl From<TrainingPeriod> for String {
    fn from(t: TrainingPeriod) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TrainingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of one forecast run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// First forecast day
    pub start_date: NaiveDate,
    /// Number of days to synthesize, in `[1, 14]`
    pub window_size: u32,
    /// Training period selecting the bias
    pub training: TrainingPeriod,
}

impl ForecastRequest {
    /// Build a request, clamping the window size into `[1, 14]`
    #[must_use]
    pub fn new(start_date: NaiveDate, window_size: u32, training: TrainingPeriod) -> Self {
        Self {
            start_date,
            window_size: clamp_window(i64::from(window_size)),
            training,
        }
    }

    /// Serialized request: `"{YYYY-MM-DD}|{window}|{training}"`
    ///
    /// The window is written after clamping, so a request built by hand with an
    /// out-of-range window seeds the same stream as its clamped form.
    #[must_use]
    pub fn seed_key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.start_date.format("%Y-%m-%d"),
            self.effective_window(),
            self.training.as_str(),
            sep = KEY_SEPARATOR
        )
    }

    /// Generator seed for this request
    #[must_use]
    pub fn seed(&self) -> Seed {
        Seed::from_key(&self.seed_key())
    }

    /// Bias factor of the training period
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.training.bias()
    }

    /// Window size after the defensive clamp
    #[must_use]
    pub fn effective_window(&self) -> u32 {
        self.window_size.clamp(MIN_WINDOW, MAX_WINDOW)
    }

    /// Calendar dates of the window in chronological order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.effective_window())
            .filter_map(move |d| self.start_date.checked_add_days(Days::new(u64::from(d))))
    }
}

/// Clamp a raw window size into `[1, 14]`
#[must_use]
pub fn clamp_window(raw: i64) -> u32 {
    raw.clamp(i64::from(MIN_WINDOW), i64::from(MAX_WINDOW)) as u32
}

/// Convert a 1-based day selector into a 0-based index inside the window
#[must_use]
pub fn clamp_day_selector(raw: i64, window_size: u32) -> usize {
    let upper = i64::from(clamp_window(i64::from(window_size)));
    (raw.clamp(1, upper) - 1) as usize
}

/// Date bounds of the start-date picker
///
/// The start date must fall in one calendar year and leave room for the
/// whole window before December 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarBounds {
    first: NaiveDate,
    last: NaiveDate,
}

impl CalendarBounds {
    /// Bounds for `year`, `None` if chrono cannot represent the year
    #[must_use]
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self {
            first: NaiveDate::from_ymd_opt(year, 1, 1)?,
            last: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// January 1 of the bounded year
    #[must_use]
    pub const fn first(&self) -> NaiveDate {
        self.first
    }

    /// December 31 of the bounded year
    #[must_use]
    pub const fn last(&self) -> NaiveDate {
        self.last
    }

    /// Latest start date that keeps `start + window - 1` inside the year
    #[must_use]
    pub fn latest_start(&self, window_size: u32) -> NaiveDate {
        let back = u64::from(clamp_window(i64::from(window_size)) - 1);
        self.last
            .checked_sub_days(Days::new(back))
            .unwrap_or(self.first)
    }

    /// Pull `start` into `[first, latest_start(window)]`
    #[must_use]
    pub fn clamp_start(&self, start: NaiveDate, window_size: u32) -> NaiveDate {
        start.clamp(self.first, self.latest_start(window_size))
    }

    /// Build a fully clamped request from raw inputs
    #[must_use]
    pub fn request(&self, start: NaiveDate, raw_window: i64, training: TrainingPeriod) -> ForecastRequest {
        let window = clamp_window(raw_window);
        ForecastRequest::new(self.clamp_start(start, window), window, training)
    }

    /// Year being bounded
    #[must_use]
    pub fn year(&self) -> i32 {
        self.first.year()
    }
}

impl Default for CalendarBounds {
    fn default() -> Self {
        Self::for_year(FORECAST_YEAR).unwrap_or(Self {
            first: NaiveDate::MIN,
            last: NaiveDate::MAX,
        })
    }
}

//! Semantic unit types for precipitation quantities
//!
//! Newtype wrappers keep precipitation depths from being mixed with plain
//! coordinates or scale factors.
//!
//! # Design Philosophy
//! - `f64` storage: the synthetic model is evaluated in double precision so
//!   repeated runs are bit-identical
//! - Total ordering via `Ord` (NaN sorts above every value)
//! - Serde support for JSON export
//!
//! # Usage
//! ```
//! use precip_forecast_core::core_types::units::Millimeters;
//!
//! let a = Millimeters::new(4.0);
//! let b = Millimeters::new(6.5);
//! assert_eq!(a.max(b), b);
//! assert_eq!(*(a + b), 10.5);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref, Div, Mul};

/// Precipitation depth in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

impl Eq for Millimeters {}

impl PartialOrd for Millimeters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Millimeters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Millimeters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Millimeters {
    /// Zero precipitation
    pub const ZERO: Self = Millimeters(0.0);

    /// Create a new depth in millimetres
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Millimeters(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Clamp into `[min, max]`
    #[inline]
    #[must_use]
    pub fn clamp_to(self, min: f64, max: f64) -> Self {
        Millimeters(self.0.clamp(min, max))
    }
}

impl From<f64> for Millimeters {
    fn from(v: f64) -> Self {
        Millimeters(v)
    }
}

impl From<Millimeters> for f64 {
    fn from(mm: Millimeters) -> f64 {
        mm.0
    }
}

impl Add for Millimeters {
    type Output = Millimeters;
    fn add(self, rhs: Millimeters) -> Millimeters {
        Millimeters(self.0 + rhs.0)
    }
}

impl AddAssign for Millimeters {
    fn add_assign(&mut self, rhs: Millimeters) {
        self.0 += rhs.0;
    }
}

impl Mul<f64> for Millimeters {
    type Output = Millimeters;
    fn mul(self, rhs: f64) -> Millimeters {
        Millimeters(self.0 * rhs)
    }
}

impl Div<f64> for Millimeters {
    type Output = Millimeters;
    fn div(self, rhs: f64) -> Millimeters {
        Millimeters(self.0 / rhs)
    }
}

impl Sum for Millimeters {
    fn sum<I: Iterator<Item = Millimeters>>(iter: I) -> Self {
        iter.fold(Millimeters::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Millimeters> for Millimeters {
    fn sum<I: Iterator<Item = &'a Millimeters>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(f, "{:.*} mm", precision, self.0)
        } else {
            write!(f, "{} mm", self.0)
        }
    }
}
